//! Cascading source resolver.
//!
//! A [`Resolver`] borrows a frozen [`KnowledgeBase`] and runs an ordered
//! chain of [`Matcher`]s over each `(name, url)` input, stopping at the first
//! hit. When every matcher declines, the input gets a deterministic fallback
//! id, so [`Resolver::resolve`] is total.

pub mod tiers;
pub mod variants;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;


use crate::config::ResolverConfig;
use crate::ids::fallback_id;
use crate::knowledge::{KnowledgeBase, NameLookup, SourceRecord};
use crate::normalize::{canonical_domain, normalize_name, skeleton, tokenize};

/// The strategy that produced a resolution, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    /// The URL's canonical domain is a confirmed record.
    ExactDomain,
    /// The normalised name is a confirmed record or a linked alias.
    Alias,
    /// A spelling or domain permutation of the name hit tier 1 or 2.
    Permutation,
    /// Token-set overlap with a confirmed record's name.
    TokenOverlap,
    /// Consonant skeleton shared with exactly one confirmed record.
    Skeleton,
    /// Close edit distance to a confirmed normalised name.
    EditDistance,
    /// Nothing matched; the id was synthesised from the name.
    Fallback,
}

impl Tier {
    /// Every tier, in precedence order.
    pub const ALL: [Tier; 7] = [
        Tier::ExactDomain,
        Tier::Alias,
        Tier::Permutation,
        Tier::TokenOverlap,
        Tier::Skeleton,
        Tier::EditDistance,
        Tier::Fallback,
    ];

    /// 1-based position in the cascade.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Tier::ExactDomain => 1,
            Tier::Alias => 2,
            Tier::Permutation => 3,
            Tier::TokenOverlap => 4,
            Tier::Skeleton => 5,
            Tier::EditDistance => 6,
            Tier::Fallback => 7,
        }
    }

    /// Short human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Tier::ExactDomain => "exact domain",
            Tier::Alias => "alias",
            Tier::Permutation => "permutation",
            Tier::TokenOverlap => "token overlap",
            Tier::Skeleton => "skeleton",
            Tier::EditDistance => "edit distance",
            Tier::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.label())
    }
}

/// A resolved target-side identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Signed 64-bit source id.
    pub id: i64,
    /// Display name written to the output backup.
    pub name: String,
    /// Which tier produced the answer. Never persisted.
    pub tier: Tier,
}

/// One input, pre-processed once and shared by every matcher.
#[derive(Debug, Clone)]
pub struct Query<'a> {
    /// Source name as it appears in the backup.
    pub name: &'a str,
    /// Canonical domain of the source URL, if it has one.
    pub domain: Option<String>,
    /// [`normalize_name`] of the name.
    pub normalized: String,
    /// [`tokenize`] of the name.
    pub tokens: BTreeSet<String>,
}

impl<'a> Query<'a> {
    /// Pre-processes an input pair.
    #[must_use]
    pub fn new(name: &'a str, url: &str) -> Self {
        Self {
            name,
            domain: canonical_domain(url),
            normalized: normalize_name(name),
            tokens: tokenize(name),
        }
    }
}

/// A confirmed name entry with its derived keys.
#[derive(Debug, Clone)]
pub struct Candidate<'kb> {
    /// Normalised-name key the record is indexed under.
    pub key: &'kb str,
    /// The confirmed record.
    pub record: &'kb SourceRecord,
    /// Tokens of the record's display name.
    pub tokens: BTreeSet<String>,
}

/// Read-only view of the knowledge base plus the scan structures the fuzzy
/// tiers need, built once per resolver.
#[derive(Debug)]
pub struct Index<'kb> {
    kb: &'kb KnowledgeBase,
    candidates: Vec<Candidate<'kb>>,
    skeletons: BTreeMap<String, &'kb SourceRecord>,
}

impl<'kb> Index<'kb> {
    /// Builds the candidate list and skeleton index from confirmed names.
    #[must_use]
    pub fn new(kb: &'kb KnowledgeBase) -> Self {
        let candidates: Vec<Candidate<'kb>> = kb
            .confirmed_names()
            .map(|(key, record)| Candidate { key, record, tokens: tokenize(&record.name) })
            .collect();

        let mut skeletons: BTreeMap<String, &'kb SourceRecord> = BTreeMap::new();
        let mut ambiguous = BTreeSet::new();
        for candidate in &candidates {
            let key = skeleton(&candidate.record.name);
            if key.is_empty() || ambiguous.contains(&key) {
                continue;
            }
            match skeletons.get(&key) {
                Some(existing) if existing.id != candidate.record.id => {
                    skeletons.remove(&key);
                    ambiguous.insert(key);
                }
                Some(_) => {}
                None => {
                    skeletons.insert(key, candidate.record);
                }
            }
        }

        Self { kb, candidates, skeletons }
    }

    /// Confirmed record for a canonical domain.
    #[must_use]
    pub fn by_domain(&self, domain: &str) -> Option<&'kb SourceRecord> {
        self.kb.domain(domain)
    }

    /// Confirmed record for a normalised name, following aliases.
    #[must_use]
    pub fn by_name(&self, normalized: &str) -> Option<&'kb SourceRecord> {
        match self.kb.name(normalized) {
            NameLookup::Confirmed(record) => Some(record),
            NameLookup::Pending(_) | NameLookup::Missing => None,
        }
    }

    /// Confirmed name entries in key order.
    #[must_use]
    pub fn candidates(&self) -> &[Candidate<'kb>] {
        &self.candidates
    }

    /// Record owning an unambiguous skeleton.
    #[must_use]
    pub fn by_skeleton(&self, key: &str) -> Option<&'kb SourceRecord> {
        self.skeletons.get(key).copied()
    }

    /// Target domain of an alias that has no id yet.
    fn pending_target(&self, normalized: &str) -> Option<&'kb str> {
        match self.kb.name(normalized) {
            NameLookup::Pending(target) => Some(target),
            NameLookup::Confirmed(_) | NameLookup::Missing => None,
        }
    }
}

/// One tier of the cascade.
pub trait Matcher: Send + Sync {
    /// The tier reported when this matcher hits.
    fn tier(&self) -> Tier;

    /// Returns the matching confirmed record, or `None` to defer to the next
    /// tier. Must not depend on anything but its arguments.
    fn find<'kb>(&self, query: &Query<'_>, index: &Index<'kb>) -> Option<&'kb SourceRecord>;
}

/// Runs the matcher chain against a frozen knowledge base.
pub struct Resolver<'kb> {
    index: Index<'kb>,
    matchers: Vec<Box<dyn Matcher>>,
}

impl<'kb> Resolver<'kb> {
    /// Creates a resolver with the standard six-matcher chain.
    #[must_use]
    pub fn new(kb: &'kb KnowledgeBase, config: &ResolverConfig) -> Self {
        Self::with_matchers(kb, tiers::standard_chain(config))
    }

    /// Creates a resolver with a custom matcher chain.
    #[must_use]
    pub fn with_matchers(kb: &'kb KnowledgeBase, matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { index: Index::new(kb), matchers }
    }

    /// Resolves a source name and URL to a target-side identity.
    ///
    /// Never fails: when no matcher hits, the id is the fallback hash of the
    /// name, or of the pending alias target if the name is a known alias
    /// whose target has no id yet.
    #[must_use]
    pub fn resolve(&self, name: &str, url: &str) -> Resolution {
        let query = Query::new(name, url);
        for matcher in &self.matchers {
            if let Some(record) = matcher.find(&query, &self.index) {
                return Resolution { id: record.id, name: record.name.clone(), tier: matcher.tier() };
            }
        }

        let seed = self.index.pending_target(&query.normalized).unwrap_or(name);
        Resolution { id: fallback_id(seed), name: name.to_string(), tier: Tier::Fallback }
    }
}

/// Per-tier resolution counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierCounts {
    counts: BTreeMap<Tier, usize>,
}

impl TierCounts {
    /// Counts one resolution.
    pub fn record(&mut self, tier: Tier) {
        *self.counts.entry(tier).or_insert(0) += 1;
    }

    /// Number of resolutions produced by `tier`.
    #[must_use]
    pub fn get(&self, tier: Tier) -> usize {
        self.counts.get(&tier).copied().unwrap_or(0)
    }

    /// Total resolutions counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Non-zero counts in tier order.
    pub fn iter(&self) -> impl Iterator<Item = (Tier, usize)> + '_ {
        self.counts.iter().map(|(tier, count)| (*tier, *count))
    }
}
