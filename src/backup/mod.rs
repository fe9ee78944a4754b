//! Backup formats at both ends of a migration.
//!
//! [`kotatsu`] reads the exporting app's zip archive; [`tachiyomi`] builds
//! and writes the importing app's document. Neither module knows how a
//! source is resolved: the reader yields [`MigrationEntry`] values and the
//! writer consumes one [`Resolution`](crate::resolve::Resolution) per entry.

pub mod kotatsu;
pub mod tachiyomi;

use thiserror::Error;

pub use kotatsu::{KotatsuBackup, MigrationEntry};
pub use tachiyomi::TachiyomiBackup;

/// Errors reading or writing a backup.
#[derive(Debug, Error)]
pub enum BackupError {
    /// The backup file could not be read or written.
    #[error("failed to access {path}: {message}")]
    Io {
        /// Path of the backup file.
        path: String,
        /// Underlying error message.
        message: String,
    },
    /// The input is not a readable zip archive.
    #[error("invalid backup archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    /// A backup entry is not the JSON it should be.
    #[error("malformed {entry} entry: {source}")]
    Json {
        /// Entry or document name.
        entry: String,
        /// Parse or serialisation error.
        #[source]
        source: serde_json::Error,
    },
    /// A required entry is absent from the archive.
    #[error("invalid backup: missing {0} entry")]
    MissingEntry(String),
}

impl BackupError {
    fn io(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Io { path: path.display().to_string(), message: err.to_string() }
    }
}
