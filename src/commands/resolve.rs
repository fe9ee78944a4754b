//! `mangabridge resolve` command.

use super::{build_knowledge, runtime};
use crate::config::Config;
use crate::context::ServiceContext;
use crate::pipeline::Pipeline;
use crate::probe::Prober;
use crate::resolve::Resolution;

/// Execute the `resolve` command with the given service context.
///
/// Prints the id, output name and tier for a single source name.
///
/// # Errors
///
/// Returns an error string if the async runtime cannot start.
pub fn run_with_context(ctx: &ServiceContext, config: &Config, name: &str, url: &str) -> Result<(), String> {
    let resolution = resolve_one(ctx, config, name, url)?;
    println!("{}", format_resolution(&resolution));
    Ok(())
}

fn resolve_one(ctx: &ServiceContext, config: &Config, name: &str, url: &str) -> Result<Resolution, String> {
    let outcome = runtime()?.block_on(async {
        let kb = build_knowledge(ctx.http.as_ref(), config).await;
        let pipeline = Pipeline::new(&config.resolver);
        let inputs = [(name, url)];
        if config.probe.enabled {
            pipeline.with_probe(Prober::new(&config.probe), ctx.http.as_ref()).run(kb, &inputs).await
        } else {
            pipeline.run(kb, &inputs).await
        }
    });
    outcome.resolutions.into_iter().next().ok_or_else(|| "resolution produced no result".to_string())
}

fn format_resolution(resolution: &Resolution) -> String {
    format!("id:   {}\nname: {}\ntier: {}", resolution.id, resolution.name, resolution.tier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{FixedClock, MemoryFileSystem, MemoryHttpClient};
    use crate::ids::fallback_id;
    use crate::resolve::Tier;
    use chrono::Utc;

    fn ctx(http: MemoryHttpClient) -> ServiceContext {
        ServiceContext::from_parts(Box::new(FixedClock(Utc::now())), Box::new(MemoryFileSystem::new()), Box::new(http))
    }

    fn offline() -> Config {
        let mut config = Config::default();
        config.go_offline();
        config
    }

    #[test]
    fn resolves_through_dead_domain_offline() {
        let resolution =
            resolve_one(&ctx(MemoryHttpClient::new()), &offline(), "Asura Scans", "https://asuratoon.com/manga/x")
                .unwrap();
        assert_eq!(resolution.id, 6_335_003_343_669_033_128);
        assert_eq!(resolution.tier, Tier::ExactDomain);
    }

    #[test]
    fn unknown_source_gets_fallback() {
        let resolution = resolve_one(&ctx(MemoryHttpClient::new()), &offline(), "Totally Unknown Source", "").unwrap();
        assert_eq!(resolution.id, fallback_id("Totally Unknown Source"));
        assert_eq!(resolution.tier, Tier::Fallback);
    }

    #[test]
    fn probe_links_a_redirected_domain() {
        let mut config = offline();
        config.probe.enabled = true;
        let http = MemoryHttpClient::new().redirect("https://old-asura.example/", "https://asuracomic.net/");

        let resolution = resolve_one(&ctx(http), &config, "Zyqx Vault", "https://old-asura.example/").unwrap();
        assert_eq!(resolution.id, 6_335_003_343_669_033_128);
        assert_eq!(resolution.tier, Tier::Alias);
    }

    #[test]
    fn formats_every_field() {
        let text = format_resolution(&Resolution { id: -3, name: "X".into(), tier: Tier::Skeleton });
        assert_eq!(text, "id:   -3\nname: X\ntier: 5 (skeleton)");
    }
}
