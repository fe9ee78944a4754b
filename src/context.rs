//! Service context bundling all port trait objects.

use std::path::Path;
use std::sync::Arc;

use crate::adapters::live::{LiveClock, LiveFileSystem, LiveHttpClient};
use crate::adapters::recording::{RecordingClock, RecordingHttpClient};
use crate::adapters::replaying::{ReplayingClock, ReplayingHttpClient};
use crate::cassette::config::CassetteConfig;
use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::config::HttpConfig;
use crate::ports::{Clock, FileSystem, HttpClient};

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Constructors wire up
/// different adapter implementations (live, replaying, recording). The
/// filesystem is always live outside of tests: backups are user input, not
/// recorded traffic.
pub struct ServiceContext {
    /// Clock for obtaining the current time.
    pub clock: Box<dyn Clock>,
    /// Filesystem for reading and writing backups.
    pub fs: Box<dyn FileSystem>,
    /// HTTP client for registry sync and probing.
    pub http: Box<dyn HttpClient>,
}

impl ServiceContext {
    /// Creates a live context with real adapters for every port.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn live(http: &HttpConfig) -> Result<Self, String> {
        let client = LiveHttpClient::new(http)
            .map_err(|e| format!("Failed to initialise HTTP client: {e}"))?;
        Ok(Self { clock: Box::new(LiveClock), fs: Box::new(LiveFileSystem), http: Box::new(client) })
    }

    /// Creates a context from explicit adapters.
    #[must_use]
    pub fn from_parts(
        clock: Box<dyn Clock>,
        fs: Box<dyn FileSystem>,
        http: Box<dyn HttpClient>,
    ) -> Self {
        Self { clock, fs, http }
    }

    /// Creates a recording context that captures clock and HTTP traffic into
    /// a new timestamped directory under `root`.
    ///
    /// Drop the context before calling [`RecordingSession::finish`].
    ///
    /// # Errors
    ///
    /// Returns an error if the session directory or HTTP client cannot be created.
    pub fn recording_at(root: &Path, http: &HttpConfig) -> Result<(Self, RecordingSession), String> {
        let session = RecordingSession::new(root)?;
        let live = Self::live(http)?;
        let ctx = Self {
            clock: Box::new(RecordingClock::new(live.clock, Arc::clone(&session.clock))),
            fs: live.fs,
            http: Box::new(RecordingHttpClient::new(live.http, Arc::clone(&session.http))),
        };
        Ok((ctx, session))
    }

    /// Creates a replaying context from a monolithic cassette file.
    ///
    /// Each port gets its own replayer over the same cassette so that
    /// per-port cursors are independent.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        let cassette = Cassette::from_yaml(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))?;

        Ok(Self {
            clock: Box::new(ReplayingClock::new(CassetteReplayer::new(&cassette))),
            fs: Box::new(LiveFileSystem),
            http: Box::new(ReplayingHttpClient::new(CassetteReplayer::new(&cassette))),
        })
    }

    /// Creates a replaying context from per-port cassette files.
    ///
    /// An unconfigured HTTP port fails every request; an unconfigured clock
    /// panics when read.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn replaying_from(config: &CassetteConfig) -> Result<Self, String> {
        let replayers = config.load_all()?;

        Ok(Self {
            clock: match replayers.clock {
                Some(r) => Box::new(ReplayingClock::new(r)),
                None => Box::new(PanickingClock),
            },
            fs: Box::new(LiveFileSystem),
            http: match replayers.http {
                Some(r) => Box::new(ReplayingHttpClient::new(r)),
                None => Box::new(ReplayingHttpClient::unconfigured()),
            },
        })
    }
}

struct PanickingClock;

impl Clock for PanickingClock {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        panic!("Clock port not configured in CassetteConfig: no cassette loaded for clock");
    }
}
