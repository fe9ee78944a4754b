//! Two-pass resolution with a probe phase in between.
//!
//! 1. Resolve every input against the knowledge base.
//! 2. Collect the inputs that fell through to the fallback tier and have a
//!    URL with a domain, one per normalised name.
//! 3. Probe those URLs for redirects, linking discoveries into the
//!    knowledge base.
//! 4. Resolve every input again; the second pass is the result.
//!
//! Each phase finishes before the next begins: the resolver only ever sees
//! a knowledge base no one is writing to.

use std::collections::BTreeSet;

use tracing::info;

use crate::config::ResolverConfig;
use crate::knowledge::{KnowledgeBase, SharedKnowledge};
use crate::normalize::{canonical_domain, normalize_name};
use crate::ports::HttpClient;
use crate::probe::{ProbeTarget, Prober};
use crate::resolve::{Resolution, Resolver, Tier, TierCounts};

/// A source name and URL pair, as read from a backup.
pub type SourceInput<'a> = (&'a str, &'a str);

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// One resolution per input, in input order.
    pub resolutions: Vec<Resolution>,
    /// Tier counts of the final pass.
    pub counts: TierCounts,
    /// Distinct names sent to the prober.
    pub probed: usize,
    /// Names the prober linked to a known source.
    pub linked: usize,
}

/// Resolve → probe → resolve driver.
pub struct Pipeline<'a> {
    config: &'a ResolverConfig,
    probe: Option<(Prober, &'a dyn HttpClient)>,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline that resolves without probing.
    #[must_use]
    pub fn new(config: &'a ResolverConfig) -> Self {
        Self { config, probe: None }
    }

    /// Enables the probe phase.
    #[must_use]
    pub fn with_probe(mut self, prober: Prober, http: &'a dyn HttpClient) -> Self {
        self.probe = Some((prober, http));
        self
    }

    /// Runs both passes over `inputs`.
    pub async fn run(&self, kb: KnowledgeBase, inputs: &[SourceInput<'_>]) -> Outcome {
        let first = resolve_pass(&kb, self.config, inputs);
        let targets = probe_targets(inputs, &first);
        info!(
            entries = inputs.len(),
            fallback = first.iter().filter(|r| r.tier == Tier::Fallback).count(),
            probe_candidates = targets.len(),
            "first resolution pass finished"
        );

        let (kb, linked) = match &self.probe {
            Some((prober, http)) if !targets.is_empty() => {
                let shared = SharedKnowledge::new(kb);
                let linked = prober.probe(*http, &targets, &shared).await;
                (shared.into_inner(), linked)
            }
            _ => (kb, 0),
        };

        let resolutions = resolve_pass(&kb, self.config, inputs);
        let mut counts = TierCounts::default();
        for resolution in &resolutions {
            counts.record(resolution.tier);
        }
        info!(
            entries = resolutions.len(),
            fallback = counts.get(Tier::Fallback),
            linked,
            "final resolution pass finished"
        );

        Outcome { resolutions, counts, probed: targets.len(), linked }
    }
}

fn resolve_pass(kb: &KnowledgeBase, config: &ResolverConfig, inputs: &[SourceInput<'_>]) -> Vec<Resolution> {
    let resolver = Resolver::new(kb, config);
    inputs.iter().map(|(name, url)| resolver.resolve(name, url)).collect()
}

/// Fallback-tier inputs with a usable domain, first occurrence per name.
fn probe_targets(inputs: &[SourceInput<'_>], first: &[Resolution]) -> Vec<ProbeTarget> {
    let mut seen = BTreeSet::new();
    inputs
        .iter()
        .zip(first)
        .filter(|(_, resolution)| resolution.tier == Tier::Fallback)
        .filter(|((_, url), _)| canonical_domain(url).is_some())
        .filter(|((name, _), _)| {
            let key = normalize_name(name);
            !key.is_empty() && seen.insert(key)
        })
        .map(|((name, url), _)| ProbeTarget { name: (*name).to_string(), url: (*url).to_string() })
        .collect()
}
