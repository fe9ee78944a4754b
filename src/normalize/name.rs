//! Source-name normalisation, tokenisation, and phonetic keys.

use std::collections::BTreeSet;

/// Top-level domains stripped from names that look like bare domains.
const TLDS: &[&str] = &[
    "com", "net", "org", "io", "co", "to", "me", "gg", "cc", "xyz", "fm", "site", "club", "live",
    "world", "app", "dev", "tech", "space", "top", "online", "info", "biz", "eu", "us", "uk", "ca",
    "au", "ru", "jp", "br", "es", "fr", "de", "it", "nl", "pl", "in", "vn", "id", "th", "tw", "cn",
    "kr", "my", "ph", "sg", "hk", "mo", "cl", "pe", "ar", "mx", "ve", "ink", "wiki", "moe",
];

/// Generic scanlation words that carry no identity. Longest first, so that
/// suffix stripping removes `scans` before `scan`.
const GENERIC_WORDS: &[&str] = &[
    "translations",
    "scanlations",
    "scanlation",
    "webtoons",
    "fansubs",
    "webtoon",
    "fansub",
    "comics",
    "novels",
    "scans",
    "comic",
    "novel",
    "scan",
    "team",
];

/// Extra words ignored when tokenising, on top of [`GENERIC_WORDS`].
const STOP_WORDS: &[&str] = &[
    "the", "and", "manga", "manhwa", "manhua", "toon", "read", "reader", "online", "official",
    "free", "com", "net", "org",
];

/// Shortest remainder left behind when stripping a glued-on generic suffix.
const MIN_STEM_LEN: usize = 3;

/// Normalises a free-text source name into its identity key.
///
/// Two spellings of the same provider map to the same key:
/// `"Asura Scans"`, `"ASURASCANS"`, `"ASURA_SCANS"`, `"Asura (EN)"` and
/// `"asuracomic.net"` all become `"ASURA"`. Bracket tags are dropped wherever
/// they appear, and so is the TLD of any dotted word. The mapping is lossy and many-to-one; an empty or
/// symbol-only name normalises to the empty string.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let lowered = strip_tags(name).to_lowercase();
    let lowered = strip_domain_parts(&lowered);

    let words: Vec<&str> =
        lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect();
    let kept: Vec<&str> = words.iter().copied().filter(|w| !GENERIC_WORDS.contains(w)).collect();
    let joined = if kept.is_empty() { words.concat() } else { kept.concat() };

    strip_glued_suffixes(&joined).to_uppercase()
}

/// Splits a name into identity-bearing words.
///
/// Lowercases, treats every non-alphanumeric character as a separator, and
/// drops words of two characters or fewer along with generic scanlation
/// jargon.
#[must_use]
pub fn tokenize(name: &str) -> BTreeSet<String> {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .filter(|w| !GENERIC_WORDS.contains(w) && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Coarse consonant key: lowercase, drop a TLD, keep letters, drop vowels.
#[must_use]
pub fn skeleton(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    strip_tld(&lowered)
        .chars()
        .filter(|c| c.is_alphabetic() && !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
        .flat_map(char::to_uppercase)
        .collect()
}

/// Jaccard similarity of the token sets of two names.
#[must_use]
pub fn jaccard(a: &str, b: &str) -> f64 {
    token_jaccard(&tokenize(a), &tokenize(b))
}

/// Jaccard similarity of two pre-computed token sets; `0.0` if either is empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn token_jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Removes `(...)` / `[...]` groups such as language tags. A name made only
/// of tags keeps its text so that it still has a key.
fn strip_tags(name: &str) -> String {
    let mut kept = String::with_capacity(name.len());
    let mut open: Option<(char, usize)> = None;
    for c in name.chars() {
        match (open, c) {
            (None, '(') => {
                open = Some((')', kept.len()));
                kept.push(c);
            }
            (None, '[') => {
                open = Some((']', kept.len()));
                kept.push(c);
            }
            (Some((close, start)), _) if c == close => {
                kept.truncate(start);
                kept.push(' ');
                open = None;
            }
            _ => kept.push(c),
        }
    }
    if kept.chars().any(char::is_alphanumeric) {
        kept
    } else {
        name.to_string()
    }
}

/// Drops `www.` and the TLD from every dotted word (`asuracomic.net`,
/// `bato.to scans`). Abbreviations such as `st.` have no TLD and survive.
fn strip_domain_parts(lowered: &str) -> String {
    lowered
        .split_whitespace()
        .map(|word| {
            if !word.contains('.') {
                return word;
            }
            strip_tld(word.strip_prefix("www.").unwrap_or(word))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_tld(value: &str) -> &str {
    match value.rsplit_once('.') {
        Some((stem, tld)) if !stem.is_empty() && TLDS.contains(&tld) => stem,
        _ => value,
    }
}

/// Strips generic words glued onto the end of a single token (`asurascans`).
fn strip_glued_suffixes(joined: &str) -> &str {
    let mut current = joined;
    'outer: loop {
        for suffix in GENERIC_WORDS {
            if let Some(stem) = current.strip_suffix(suffix) {
                if stem.chars().count() >= MIN_STEM_LEN {
                    current = stem;
                    continue 'outer;
                }
            }
        }
        return current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalent_spellings_normalize_identically() {
        assert_eq!(normalize_name("Asura Scans"), "ASURA");
        assert_eq!(normalize_name("ASURASCANS"), "ASURA");
        assert_eq!(normalize_name("Asura (EN)"), "ASURA");
        assert_eq!(normalize_name("ASURA_SCANS"), "ASURA");
        assert_eq!(normalize_name("asuracomic.net"), "ASURA");
    }

    #[test]
    fn strips_tld_from_bare_domains() {
        assert_eq!(normalize_name("Bato.to"), "BATO");
        assert_eq!(normalize_name("www.mangadex.org"), "MANGADEX");
        assert_eq!(normalize_name("flamecomics.com"), "FLAME");
    }

    #[test]
    fn strips_tld_from_dotted_words_inside_longer_names() {
        assert_eq!(normalize_name("Bato.to Scans"), "BATO");
        assert_eq!(normalize_name("Read at www.mangadex.org"), normalize_name("Read at MangaDex"));
    }

    #[test]
    fn keeps_dots_inside_multi_word_names() {
        assert_eq!(normalize_name("Manga St. Reader"), "MANGASTREADER");
    }

    #[test]
    fn strips_stacked_generic_words() {
        assert_eq!(normalize_name("Reaper Scans Team"), "REAPER");
        assert_eq!(normalize_name("reaperscansteam"), "REAPER");
    }

    #[test]
    fn keeps_name_made_only_of_generic_words() {
        assert_eq!(normalize_name("Webtoons"), "WEBTOONS");
        assert_eq!(normalize_name("Comic Team"), "COMIC");
    }

    #[test]
    fn does_not_strip_suffix_below_min_stem() {
        assert_eq!(normalize_name("Steam"), "STEAM");
    }

    #[test]
    fn removes_bracket_tags_of_either_kind() {
        assert_eq!(normalize_name("Komikcast [ID] (Mirror)"), "KOMIKCAST");
        assert_eq!(normalize_name("(EN)"), "EN");
    }

    #[test]
    fn removes_tags_wherever_they_appear() {
        assert_eq!(normalize_name("Luminous Scans (EN) Scans"), normalize_name("Luminous Scans"));
        assert_eq!(normalize_name("X (EN) Scans"), normalize_name("X"));
        assert_eq!(normalize_name("[ID] Komikcast"), "KOMIKCAST");
    }

    #[test]
    fn unclosed_bracket_keeps_its_text() {
        assert_eq!(normalize_name("Night Owl (EN"), "NIGHTOWLEN");
    }

    #[test]
    fn keeps_non_latin_letters() {
        assert_eq!(normalize_name("漫画 Scans"), "漫画");
    }

    #[test]
    fn empty_and_symbol_names_normalize_to_empty() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("---"), "");
    }

    #[test]
    fn tokenize_drops_short_and_generic_words() {
        let tokens = tokenize("The Asura Scans of EN-Land");
        let expected: BTreeSet<String> = ["asura", "land"].iter().map(|s| (*s).to_string()).collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn tokenize_of_empty_name_is_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("Scans Team").is_empty());
    }

    #[test]
    fn skeleton_drops_vowels_and_tld() {
        assert_eq!(skeleton("Asura"), "SR");
        assert_eq!(skeleton("mangadex.org"), "MNGDX");
        assert_eq!(skeleton("Manga-Dex 2"), "MNGDX");
        assert_eq!(skeleton(""), "");
    }

    #[test]
    fn jaccard_scores_overlap() {
        assert!((jaccard("Night Owl Scans", "Night Owl") - 1.0).abs() < f64::EPSILON);
        assert!((jaccard("Night Owl Archive", "Night Owl Library") - 0.5).abs() < f64::EPSILON);
        assert!(jaccard("Alpha", "Omega").abs() < f64::EPSILON);
    }

    #[test]
    fn jaccard_is_zero_for_empty_token_sets() {
        assert!(jaccard("", "Asura").abs() < f64::EPSILON);
        assert!(jaccard("Scans", "Scans").abs() < f64::EPSILON);
    }
}
