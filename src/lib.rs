//! Core library for the `mangabridge` CLI.
//!
//! Migrates a Kotatsu backup to a Tachiyomi backup. The hard part is the
//! source resolution: every favourite's source is mapped to the target
//! app's numeric source id through a tiered cascade over a knowledge base
//! assembled from static tables, extension registries, and redirect probes.

pub mod adapters;
pub mod backup;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod ids;
pub mod knowledge;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod ports;
pub mod probe;
pub mod resolve;
pub mod sync;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli)
}
