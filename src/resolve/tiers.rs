//! The six knowledge-backed matchers, in precedence order.

use strsim::normalized_levenshtein;

use super::variants::{domain_guesses, name_variants};
use super::{Index, Matcher, Query, Tier};
use crate::config::ResolverConfig;
use crate::knowledge::SourceRecord;
use crate::normalize::{normalize_name, skeleton, token_jaccard};

/// Builds the standard matcher chain from configuration.
#[must_use]
pub fn standard_chain(config: &ResolverConfig) -> Vec<Box<dyn Matcher>> {
    vec![
        Box::new(ExactDomain),
        Box::new(AliasName),
        Box::new(Permutation { language_tags: config.language_tags.clone() }),
        Box::new(TokenOverlap { threshold: config.token_threshold }),
        Box::new(SkeletonMatch { min_len: config.skeleton_min_len }),
        Box::new(EditDistance { threshold: config.edit_threshold }),
    ]
}

/// Tier 1: the URL's canonical domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactDomain;

impl Matcher for ExactDomain {
    fn tier(&self) -> Tier {
        Tier::ExactDomain
    }

    fn find<'kb>(&self, query: &Query<'_>, index: &Index<'kb>) -> Option<&'kb SourceRecord> {
        index.by_domain(query.domain.as_deref()?)
    }
}

/// Tier 2: the normalised name, directly or through an alias.
#[derive(Debug, Clone, Copy, Default)]
pub struct AliasName;

impl Matcher for AliasName {
    fn tier(&self) -> Tier {
        Tier::Alias
    }

    fn find<'kb>(&self, query: &Query<'_>, index: &Index<'kb>) -> Option<&'kb SourceRecord> {
        if query.normalized.is_empty() {
            return None;
        }
        index.by_name(&query.normalized)
    }
}

/// Tier 3: spelling variants re-probed by name, then guessed domains.
#[derive(Debug, Clone, Default)]
pub struct Permutation {
    /// Bare language tags dropped from the end of a name (`"Reaper EN"`).
    pub language_tags: Vec<String>,
}

impl Matcher for Permutation {
    fn tier(&self) -> Tier {
        Tier::Permutation
    }

    fn find<'kb>(&self, query: &Query<'_>, index: &Index<'kb>) -> Option<&'kb SourceRecord> {
        for variant in name_variants(query.name, &self.language_tags) {
            let key = normalize_name(&variant);
            if !key.is_empty() && key != query.normalized {
                if let Some(record) = index.by_name(&key) {
                    return Some(record);
                }
            }
        }
        domain_guesses(query.name).iter().find_map(|guess| index.by_domain(guess))
    }
}

/// Tier 4: best Jaccard overlap with a confirmed display name.
#[derive(Debug, Clone, Copy)]
pub struct TokenOverlap {
    /// Minimum accepted score, inclusive.
    pub threshold: f64,
}

impl Matcher for TokenOverlap {
    fn tier(&self) -> Tier {
        Tier::TokenOverlap
    }

    fn find<'kb>(&self, query: &Query<'_>, index: &Index<'kb>) -> Option<&'kb SourceRecord> {
        if query.tokens.is_empty() {
            return None;
        }
        let input_len = query.name.chars().count();

        let mut best: Option<(f64, usize, &'kb SourceRecord)> = None;
        for candidate in index.candidates() {
            let score = token_jaccard(&query.tokens, &candidate.tokens);
            if score <= 0.0 {
                continue;
            }
            let len_diff = input_len.abs_diff(candidate.record.name.chars().count());
            let better = match best {
                None => true,
                Some((best_score, best_diff, _)) => {
                    let tied = (score - best_score).abs() < f64::EPSILON;
                    (score > best_score && !tied) || (tied && len_diff < best_diff)
                }
            };
            if better {
                best = Some((score, len_diff, candidate.record));
            }
        }

        best.filter(|(score, _, _)| *score >= self.threshold).map(|(_, _, record)| record)
    }
}

/// Tier 5: a consonant skeleton owned by exactly one record.
#[derive(Debug, Clone, Copy)]
pub struct SkeletonMatch {
    /// Shortest skeleton considered distinctive.
    pub min_len: usize,
}

impl Matcher for SkeletonMatch {
    fn tier(&self) -> Tier {
        Tier::Skeleton
    }

    fn find<'kb>(&self, query: &Query<'_>, index: &Index<'kb>) -> Option<&'kb SourceRecord> {
        let key = skeleton(query.name);
        if key.chars().count() < self.min_len {
            return None;
        }
        index.by_skeleton(&key)
    }
}

/// Tier 6: nearest normalised-name key by normalised Levenshtein similarity.
#[derive(Debug, Clone, Copy)]
pub struct EditDistance {
    /// Minimum accepted similarity, inclusive.
    pub threshold: f64,
}

impl Matcher for EditDistance {
    fn tier(&self) -> Tier {
        Tier::EditDistance
    }

    fn find<'kb>(&self, query: &Query<'_>, index: &Index<'kb>) -> Option<&'kb SourceRecord> {
        if query.normalized.is_empty() {
            return None;
        }
        let mut best: Option<(f64, &'kb SourceRecord)> = None;
        for candidate in index.candidates() {
            let score = normalized_levenshtein(&query.normalized, candidate.key);
            match best {
                Some((best_score, _)) if best_score >= score => {}
                _ => best = Some((score, candidate.record)),
            }
        }
        best.filter(|(score, _)| *score >= self.threshold).map(|(_, record)| record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeBase;
    use crate::resolve::{Resolver, Tier};

    fn resolver(kb: &KnowledgeBase) -> Resolver<'_> {
        Resolver::new(kb, &ResolverConfig::default())
    }

    fn find_with(matcher: &dyn Matcher, kb: &KnowledgeBase, name: &str, url: &str) -> Option<i64> {
        let index = Index::new(kb);
        matcher.find(&Query::new(name, url), &index).map(|r| r.id)
    }

    #[test]
    fn exact_domain_ignores_placeholders_and_bad_urls() {
        let mut kb = KnowledgeBase::new();
        kb.add_alias("oldsite.com", "newsite.com");
        kb.register(Some(5), "Site", Some("site.org"));

        assert_eq!(find_with(&ExactDomain, &kb, "", "https://m.site.org/a"), Some(5));
        assert_eq!(find_with(&ExactDomain, &kb, "", "https://oldsite.com"), None);
        assert_eq!(find_with(&ExactDomain, &kb, "", "/relative/path"), None);
    }

    #[test]
    fn alias_tier_matches_normalized_spellings() {
        let mut kb = KnowledgeBase::new();
        kb.register(Some(8), "Asura Scans", Some("asuracomic.net"));

        for name in ["ASURASCANS", "Asura (EN)", "asura_scans"] {
            let result = resolver(&kb).resolve(name, "");
            assert_eq!((result.id, result.tier), (8, Tier::Alias), "{name}");
        }
    }

    #[test]
    fn permutation_finds_guessed_domain() {
        let mut kb = KnowledgeBase::new();
        kb.register(Some(12), "Reaper Scans Official", Some("reaperscans.com"));

        let result = resolver(&kb).resolve("Reaper", "");
        assert_eq!((result.id, result.tier), (12, Tier::Permutation));
    }

    #[test]
    fn permutation_of_bare_domain_name() {
        let mut kb = KnowledgeBase::new();
        kb.register(Some(13), "Kakalot Mirror", Some("mangakakalot.com"));

        let result = resolver(&kb).resolve("MangaKakalot", "");
        assert_eq!((result.id, result.tier), (13, Tier::Permutation));
    }

    #[test]
    fn permutation_finds_name_without_language_tag() {
        let mut kb = KnowledgeBase::new();
        kb.register(Some(14), "Reaper Scans", Some("reaper.example"));

        let result = resolver(&kb).resolve("REAPERSCANS_EN", "");
        assert_eq!((result.id, result.tier), (14, Tier::Permutation));
        assert!(domain_guesses("REAPERSCANS_EN").iter().all(|guess| guess != "reaper.example"));
    }

    #[test]
    fn permutation_finds_name_without_glued_filler() {
        let mut kb = KnowledgeBase::new();
        kb.register(Some(15), "Kakalot", Some("kakalot.example"));

        let matcher = Permutation { language_tags: Vec::new() };
        assert_eq!(find_with(&matcher, &kb, "MangaKakalot", ""), Some(15));
        assert_eq!(find_with(&matcher, &kb, "Kakalot Mirror", ""), None);
    }

    #[test]
    fn token_overlap_accepts_at_threshold() {
        let mut kb = KnowledgeBase::new();
        kb.register(Some(21), "Night Owl Archive", Some("a.example"));

        let matcher = TokenOverlap { threshold: 0.5 };
        assert_eq!(find_with(&matcher, &kb, "Night Owl Library", ""), Some(21));
        let strict = TokenOverlap { threshold: 0.51 };
        assert_eq!(find_with(&strict, &kb, "Night Owl Library", ""), None);
    }

    #[test]
    fn token_overlap_breaks_ties_by_length_difference() {
        let mut kb = KnowledgeBase::new();
        kb.register(Some(1), "Lunar Tides Anthology", Some("a.example"));
        kb.register(Some(2), "Lunar Tides Weekly", Some("b.example"));

        let matcher = TokenOverlap { threshold: 0.5 };
        // Both score 2/4; the second is closer in length despite sorting later.
        assert_eq!(find_with(&matcher, &kb, "Lunar Tides Network", ""), Some(2));
    }

    #[test]
    fn skeleton_tier_survives_vowel_changes() {
        let mut kb = KnowledgeBase::new();
        kb.register(Some(30), "Kiryuu", Some("kiryuu.id"));

        let result = resolver(&kb).resolve("Kiriyu", "");
        assert_eq!((result.id, result.tier), (30, Tier::Skeleton));
    }

    #[test]
    fn skeleton_tier_respects_min_length() {
        let mut kb = KnowledgeBase::new();
        kb.register(Some(31), "Ao", Some("ao.example"));
        assert_eq!(find_with(&SkeletonMatch { min_len: 3 }, &kb, "Ai", ""), None);
    }

    #[test]
    fn edit_distance_accepts_close_typos() {
        let mut kb = KnowledgeBase::new();
        kb.register(Some(40), "Starlightlibrary", Some("star.example"));

        let matcher = EditDistance { threshold: 0.85 };
        assert_eq!(find_with(&matcher, &kb, "Starlihgtlibrary", ""), Some(40));
        assert_eq!(find_with(&matcher, &kb, "Sunriselibrary", ""), None);
    }

    #[test]
    fn standard_chain_is_in_tier_order() {
        let chain = standard_chain(&ResolverConfig::default());
        let tiers: Vec<Tier> = chain.iter().map(|m| m.tier()).collect();
        assert_eq!(tiers, Tier::ALL[..6].to_vec());
    }
}
