//! Records interactions into a cassette file.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::format::{Cassette, Interaction};

/// Records interactions and writes them as a YAML cassette file.
///
/// The cassette is stamped with the time the recorder was created, so every
/// port of one session shares its start time.
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    name: String,
    commit: String,
    started_at: DateTime<Utc>,
    interactions: Vec<Interaction>,
}

impl CassetteRecorder {
    /// Create a new recorder that will write to the given path.
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        commit: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            commit: commit.into(),
            started_at: Utc::now(),
            interactions: Vec::new(),
        }
    }

    /// Record an interaction; its `seq` is its position in the cassette.
    pub fn record(&mut self, port: &str, method: &str, input: serde_json::Value, output: serde_json::Value) {
        let seq = self.interactions.len() as u64;
        self.interactions.push(Interaction { seq, port: port.into(), method: method.into(), input, output });
    }

    /// Number of interactions recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Finish recording and write the cassette YAML file to disk, creating
    /// parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn finish(self) -> Result<PathBuf, std::io::Error> {
        let cassette = Cassette {
            name: self.name,
            recorded_at: self.started_at,
            commit: self.commit,
            interactions: self.interactions,
        };
        let yaml = serde_yaml::to_string(&cassette).map_err(std::io::Error::other)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, yaml)?;
        Ok(self.path)
    }
}
