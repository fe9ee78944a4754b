//! Replaying adapter for the `Clock` port.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

use crate::cassette::replayer::CassetteReplayer;
use crate::ports::Clock;

/// Replays recorded clock values from a cassette.
pub struct ReplayingClock {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingClock {
    /// Creates a new replaying clock from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl Clock for ReplayingClock {
    /// # Panics
    ///
    /// Panics when the cassette is exhausted or holds something other than a
    /// timestamp; a replay that diverges from its recording cannot continue.
    fn now(&self) -> DateTime<Utc> {
        let output = {
            let mut replayer = self.replayer.lock().unwrap_or_else(PoisonError::into_inner);
            replayer.next_interaction("clock", "now").output.clone()
        };
        serde_json::from_value(output)
            .unwrap_or_else(|e| panic!("clock::now: recorded value is not a timestamp: {e}"))
    }
}
