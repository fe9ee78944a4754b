//! Clock port for obtaining the current time.

use chrono::{DateTime, Utc};

/// Provides the current time.
///
/// The backup writer stamps chapter fetch dates with it; replaying a
/// recorded clock keeps converted backups byte-identical across runs.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}
