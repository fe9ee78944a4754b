//! Command dispatch and handlers.

pub mod id;
pub mod migrate;
pub mod resolve;

use std::env;
use std::path::PathBuf;

use tokio::runtime::Runtime;
use tracing::info;

use crate::adapters::live::LiveFileSystem;
use crate::cassette::config::CassetteConfig;
use crate::cassette::session::RecordingSession;
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::context::ServiceContext;
use crate::knowledge::{KnowledgeBase, SharedKnowledge};
use crate::ports::HttpClient;
use crate::sync::sync_all;

/// Environment variable naming a directory to record port traffic into.
pub const RECORD_ENV: &str = "MANGABRIDGE_RECORD";
/// Environment variable naming a directory of per-port cassettes to replay.
pub const REPLAY_ENV: &str = "MANGABRIDGE_REPLAY";

/// Dispatch a parsed command line to its handler.
///
/// When `MANGABRIDGE_RECORD` is set to a directory path, clock and HTTP
/// interactions are recorded to per-port cassette files in a new session
/// directory under it. When `MANGABRIDGE_REPLAY` is set, they are served
/// from the cassettes in that directory instead of the network.
///
/// # Errors
///
/// Returns an error string if configuration cannot be loaded, the context
/// cannot be built, or the selected command handler fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    if let Command::Id { seed } = &cli.command {
        return id::run(seed);
    }

    let config = Config::load(&LiveFileSystem, cli.config.as_deref())?;

    let (ctx, session) = if let Ok(path) = env::var(RECORD_ENV) {
        let (ctx, session) = ServiceContext::recording_at(&PathBuf::from(path), &config.http)?;
        (ctx, Some(session))
    } else if let Ok(path) = env::var(REPLAY_ENV) {
        let cassettes = CassetteConfig::from_dir(&PathBuf::from(path));
        (ServiceContext::replaying_from(&cassettes)?, None)
    } else {
        (ServiceContext::live(&config.http)?, None)
    };

    let result = dispatch_with_context(&cli.command, &ctx, config);

    // Recorders must be released before the session flushes.
    if let Some(session) = session {
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

/// Dispatch a command with the given service context and configuration.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch_with_context(
    command: &Command,
    ctx: &ServiceContext,
    mut config: Config,
) -> Result<(), String> {
    match command {
        Command::Migrate { input, output, offline, no_probe } => {
            if *offline {
                config.go_offline();
            }
            if *no_probe {
                config.probe.enabled = false;
            }
            migrate::run_with_context(ctx, &config, input, output)
        }
        Command::Resolve { name, url, offline } => {
            if *offline {
                config.go_offline();
            }
            resolve::run_with_context(ctx, &config, name, url)
        }
        Command::Id { seed } => id::run(seed),
    }
}

/// Builds the single-threaded runtime commands drive async work on.
fn runtime() -> Result<Runtime, String> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))
}

/// Static tables, then registry sync when enabled.
async fn build_knowledge(http: &dyn HttpClient, config: &Config) -> KnowledgeBase {
    let shared = SharedKnowledge::new(KnowledgeBase::with_static_tables());
    let report = sync_all(http, &config.sync, &shared).await;
    let kb = shared.into_inner();
    info!(
        parsers = report.parsers,
        index_sources = report.index_sources,
        domains = kb.confirmed_domain_count(),
        pending = kb.pending_name_count(),
        "knowledge base ready"
    );
    kb
}

/// Finish a recording session and print the output directory.
fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir = session.finish()?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}
