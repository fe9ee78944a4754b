//! `mangabridge migrate` command.

use std::fmt::Write;
use std::path::Path;

use tracing::info;

use super::{build_knowledge, runtime};
use crate::backup::{KotatsuBackup, TachiyomiBackup};
use crate::config::Config;
use crate::context::ServiceContext;
use crate::pipeline::{Outcome, Pipeline, SourceInput};
use crate::probe::Prober;
use crate::resolve::Tier;

/// Execute the `migrate` command with the given service context.
///
/// Reads the Kotatsu backup at `input`, resolves every favourite's source,
/// and writes the Tachiyomi backup to `output`.
///
/// # Errors
///
/// Returns an error string if the input backup cannot be read or the output
/// cannot be written. Network failures never fail the command.
pub fn run_with_context(
    ctx: &ServiceContext,
    config: &Config,
    input: &Path,
    output: &Path,
) -> Result<(), String> {
    let backup = KotatsuBackup::read(ctx.fs.as_ref(), input).map_err(|e| e.to_string())?;
    let entries = backup.entries();
    if entries.is_empty() {
        info!(input = %input.display(), "backup has no favourites to migrate");
    }
    let inputs: Vec<SourceInput<'_>> = entries.iter().map(|e| (e.source_name, e.source_url)).collect();

    let outcome = runtime()?.block_on(async {
        let kb = build_knowledge(ctx.http.as_ref(), config).await;
        let pipeline = Pipeline::new(&config.resolver);
        if config.probe.enabled {
            pipeline.with_probe(Prober::new(&config.probe), ctx.http.as_ref()).run(kb, &inputs).await
        } else {
            pipeline.run(kb, &inputs).await
        }
    });

    let converted = TachiyomiBackup::convert(&backup, &outcome.resolutions, ctx.clock.now());
    converted.write(ctx.fs.as_ref(), output).map_err(|e| e.to_string())?;
    info!(output = %output.display(), manga = converted.backup_manga.len(), "wrote Tachiyomi backup");

    print!("{}", summary(&outcome, &converted, output));
    Ok(())
}

/// Human-readable run statistics.
fn summary(outcome: &Outcome, converted: &TachiyomiBackup, output: &Path) -> String {
    let mut text = String::new();
    let _ = writeln!(
        text,
        "Migrated {} manga across {} sources to {}",
        converted.backup_manga.len(),
        converted.backup_sources.len(),
        output.display()
    );
    for tier in Tier::ALL {
        let _ = writeln!(text, "  tier {tier}: {}", outcome.counts.get(tier));
    }
    if outcome.probed > 0 {
        let _ = writeln!(text, "  probed {} unresolved, linked {}", outcome.probed, outcome.linked);
    }
    let fallback = outcome.counts.get(Tier::Fallback);
    if fallback > 0 {
        let _ = writeln!(text, "  {fallback} entries use generated ids");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{FixedClock, MemoryFileSystem, MemoryHttpClient};
    use crate::backup::kotatsu::tests::zip_of;
    use crate::ids::fallback_id;
    use crate::ports::FileSystem;
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    const FAVOURITES: &str = r#"[
        {"category_id": 1, "created_at": 1700000000000,
         "manga": {"id": 10, "title": "Solo Climb", "url": "/manga/solo", "public_url": "https://asuratoon.com/manga/solo", "source": "ASURASCANS", "state": "ONGOING"}},
        {"category_id": 1, "created_at": 1700000000001,
         "manga": {"id": 11, "title": "Tower", "url": "/manga/tower", "public_url": "https://asuracomic.net/manga/tower", "source": "Asura Scans"}},
        {"category_id": 1, "created_at": 1700000000002,
         "manga": {"id": 12, "title": "Mystery", "url": "/m", "source": "Totally Unknown Source"}}
    ]"#;

    fn context(fs: MemoryFileSystem) -> ServiceContext {
        ServiceContext::from_parts(
            Box::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())),
            Box::new(fs),
            Box::new(MemoryHttpClient::new()),
        )
    }

    fn offline() -> Config {
        let mut config = Config::default();
        config.go_offline();
        config
    }

    #[test]
    fn migrates_offline_with_static_tables() {
        let fs = MemoryFileSystem::new();
        fs.insert("Backup.zip", zip_of(&[("favourites", FAVOURITES), ("categories", r#"[{"id":1,"name":"Reading","sortKey":3}]"#)]));
        let ctx = context(fs);

        run_with_context(&ctx, &offline(), Path::new("Backup.zip"), Path::new("out/backup.json")).unwrap();

        let written = ctx.fs.read_bytes(Path::new("out/backup.json")).unwrap();
        let doc: Value = serde_json::from_slice(&written).unwrap();
        let asura = 6_335_003_343_669_033_128_i64;
        let sources: Vec<i64> =
            doc["backupSources"].as_array().unwrap().iter().map(|s| s["sourceId"].as_i64().unwrap()).collect();
        assert_eq!(sources, vec![asura, fallback_id("Totally Unknown Source")]);
        assert_eq!(doc["backupManga"][0]["source"].as_i64(), Some(asura));
        assert_eq!(doc["backupManga"][1]["source"].as_i64(), Some(asura));
        assert_eq!(doc["backupManga"][0]["categories"], serde_json::json!([3]));
    }

    #[test]
    fn missing_input_is_an_error() {
        let ctx = context(MemoryFileSystem::new());
        let err = run_with_context(&ctx, &offline(), Path::new("Backup.zip"), Path::new("out.json")).unwrap_err();
        assert!(err.starts_with("failed to access Backup.zip"), "got: {err}");
    }

    #[test]
    fn network_failures_do_not_fail_the_run() {
        let fs = MemoryFileSystem::new();
        fs.insert("Backup.zip", zip_of(&[("favourites", FAVOURITES)]));
        let ctx = context(fs);

        // Every request is refused by the empty in-memory client.
        run_with_context(&ctx, &Config::default(), Path::new("Backup.zip"), Path::new("out.json")).unwrap();
        assert!(ctx.fs.exists(Path::new("out.json")));
    }

    #[test]
    fn summary_lists_every_tier() {
        let outcome = Outcome {
            resolutions: Vec::new(),
            counts: crate::resolve::TierCounts::default(),
            probed: 2,
            linked: 1,
        };
        let text = summary(&outcome, &TachiyomiBackup::default(), Path::new("o.json"));
        assert!(text.starts_with("Migrated 0 manga across 0 sources to o.json"));
        assert_eq!(text.matches("  tier ").count(), Tier::ALL.len());
        assert!(text.contains("probed 2 unresolved, linked 1"));
    }
}
