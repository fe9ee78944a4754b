//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `mangabridge`.
#[derive(Debug, Parser)]
#[command(name = "mangabridge", version, about = "Migrate a Kotatsu backup to Tachiyomi")]
pub struct Cli {
    /// Configuration file (defaults to `mangabridge.yaml` when present).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert a Kotatsu backup into a Tachiyomi backup.
    Migrate {
        /// Kotatsu backup archive to read.
        #[arg(long, short, default_value = "Backup.zip")]
        input: PathBuf,
        /// Where to write the Tachiyomi backup.
        #[arg(long, short, default_value = "output/Backup.tachiyomi.json")]
        output: PathBuf,
        /// Skip registry sync and probing; resolve from static tables only.
        #[arg(long)]
        offline: bool,
        /// Skip redirect probing of unresolved sources.
        #[arg(long)]
        no_probe: bool,
    },
    /// Resolve a single source name and print the result.
    Resolve {
        /// Source name as written in the backup.
        name: String,
        /// Source or manga URL.
        #[arg(long, default_value = "")]
        url: String,
        /// Skip registry sync and probing.
        #[arg(long)]
        offline: bool,
    },
    /// Print the fallback id for a seed string.
    Id {
        /// Seed to hash.
        seed: String,
    },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;
    use std::path::Path;

    #[test]
    fn migrate_has_defaults() {
        let cli = Cli::parse_from(["mangabridge", "migrate"]);
        let Command::Migrate { input, output, offline, no_probe } = cli.command else {
            panic!("expected migrate");
        };
        assert_eq!(input, Path::new("Backup.zip"));
        assert_eq!(output, Path::new("output/Backup.tachiyomi.json"));
        assert!(!offline && !no_probe);
    }

    #[test]
    fn parses_resolve_with_url_and_global_config() {
        let cli = Cli::parse_from([
            "mangabridge",
            "resolve",
            "Asura Scans",
            "--url",
            "https://asuratoon.com/manga/x",
            "--config",
            "custom.yaml",
        ]);
        assert_eq!(cli.config.as_deref(), Some(Path::new("custom.yaml")));
        assert!(matches!(
            cli.command,
            Command::Resolve { ref name, ref url, offline: false }
                if name == "Asura Scans" && url == "https://asuratoon.com/manga/x"
        ));
    }

    #[test]
    fn parses_id_subcommand() {
        let cli = Cli::parse_from(["mangabridge", "id", "MangaDex"]);
        assert!(matches!(cli.command, Command::Id { ref seed } if seed == "MangaDex"));
    }

    #[test]
    fn resolve_requires_a_name() {
        assert!(Cli::try_parse_from(["mangabridge", "resolve"]).is_err());
    }
}
