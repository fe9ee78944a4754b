//! Live clock using the system clock.

use chrono::{DateTime, Utc};

use crate::ports::Clock;

/// Live clock that returns the real current time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveClock;

impl Clock for LiveClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_current_time() {
        let before = Utc::now();
        let now = LiveClock.now();
        assert!(now >= before);
        assert!(now <= Utc::now());
    }
}
