//! Registry sync: populates the knowledge base from remote registries.
//!
//! Two registries are consulted, in a fixed order so that the last writer
//! is always the same one:
//!
//! 1. the Doki parser repository, which maps the exporting app's parser
//!    keys to domains ([`doki`]);
//! 2. the Keiyoushi extension index, which supplies the target-side ids for
//!    those domains ([`keiyoushi`]).
//!
//! Network and parse failures are logged and cost only knowledge; sync
//! never fails.

pub mod doki;
pub mod keiyoushi;

use tracing::info;

use crate::config::SyncConfig;
use crate::knowledge::SharedKnowledge;
use crate::ports::HttpClient;

/// What a sync run learned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Parser files that contributed aliases or records.
    pub parsers: usize,
    /// Extension index sources registered.
    pub index_sources: usize,
}

/// Runs every registry sync against `kb`.
///
/// Does nothing when sync is disabled.
pub async fn sync_all(http: &dyn HttpClient, config: &SyncConfig, kb: &SharedKnowledge) -> SyncReport {
    if !config.enabled {
        info!("registry sync disabled, using static tables only");
        return SyncReport::default();
    }

    let parsers = doki::sync(http, config, kb).await;
    let index_sources = keiyoushi::sync(http, config, kb).await;
    info!(parsers, index_sources, "registry sync finished");
    SyncReport { parsers, index_sources }
}
