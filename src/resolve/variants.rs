//! Name permutations re-probed by the permutation tier.

/// Words that decorate a source name without identifying it.
const FILLER_WORDS: &[&str] =
    &["the", "official", "read", "online", "free", "manga", "manhwa", "manhua", "toon"];

/// Filler glued onto the front of a one-word name (`MangaKakalot`).
const GLUED_PREFIXES: &[&str] = &["manga", "read", "the"];

/// Filler glued onto the end of a one-word name (`Asuratoon`).
const GLUED_SUFFIXES: &[&str] = &["toon", "online", "official"];

/// Shortest stem left behind when ungluing filler.
const MIN_STEM_LEN: usize = 3;

/// Suffixes glued onto a compact name when guessing a domain.
const DOMAIN_SUFFIXES: &[&str] = &["", "scans", "comics", "-scans", "comic", "toon"];

/// TLDs tried when guessing a domain from a name.
const DOMAIN_TLDS: &[&str] = &["com", "net", "org", "to", "io"];

/// Alternative spellings of `name` that normalise to a different key.
///
/// Built from the raw words of the name: a bare trailing language tag
/// (`"Reaper Scans EN"`, `"MANGADEX_PT-BR"`) is dropped, filler words such as
/// `Official` or `Manga` are dropped, and filler glued onto a compact form
/// (`MangaKakalot`, `Asuratoon`) is cut off. The original spelling is not
/// included. Order is deterministic and duplicates are removed.
#[must_use]
pub fn name_variants(name: &str, language_tags: &[String]) -> Vec<String> {
    let words = words_of(name);
    if words.is_empty() {
        return Vec::new();
    }

    let mut spellings = vec![words.clone()];
    if let Some(untagged) = without_language_tag(&words, language_tags) {
        spellings.push(untagged);
    }
    for spelling in spellings.clone() {
        let plain: Vec<String> =
            spelling.iter().filter(|w| !FILLER_WORDS.contains(&w.as_str())).cloned().collect();
        if !plain.is_empty() && plain.len() < spelling.len() {
            spellings.push(plain);
        }
    }

    let original = words.join(" ");
    let mut variants = Vec::new();
    for spelling in &spellings {
        push_unique(&mut variants, spelling.join(" "), &original);
        for stem in unglued(&spelling.concat()) {
            push_unique(&mut variants, stem.to_string(), &original);
        }
    }
    variants
}

/// Bare domains a source with this name plausibly lives on, e.g.
/// `"Reaper"` yields `reaper.com`, `reaperscans.com`, and so on.
#[must_use]
pub fn domain_guesses(name: &str) -> Vec<String> {
    let stems = domain_stems(name);
    let mut guesses = Vec::new();
    for stem in &stems {
        for suffix in DOMAIN_SUFFIXES {
            for tld in DOMAIN_TLDS {
                let guess = format!("{stem}{suffix}.{tld}");
                if !guesses.contains(&guess) {
                    guesses.push(guess);
                }
            }
        }
    }
    guesses
}

/// Lowercase alphanumeric spellings of a name suitable as a domain label.
fn domain_stems(name: &str) -> Vec<String> {
    let mut stems = Vec::new();
    let compact: String = name
        .chars()
        .take_while(|c| !matches!(c, '(' | '['))
        .filter(char::is_ascii_alphanumeric)
        .flat_map(|c| c.to_lowercase())
        .collect();
    if !compact.is_empty() {
        stems.push(compact);
    }

    let normalized = crate::normalize::normalize_name(name).to_ascii_lowercase();
    if !normalized.is_empty() && normalized.is_ascii() && !stems.contains(&normalized) {
        stems.push(normalized);
    }
    stems
}

/// Lowercase words of a name; dots stay inside words so `bato.to` survives.
fn words_of(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '.'))
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .map(str::to_string)
        .collect()
}

fn without_language_tag(words: &[String], language_tags: &[String]) -> Option<Vec<String>> {
    language_tags.iter().find_map(|tag| {
        let tag_words = words_of(tag);
        let keep = words.len().checked_sub(tag_words.len())?;
        (!tag_words.is_empty() && keep > 0 && words.ends_with(&tag_words)).then(|| words[..keep].to_vec())
    })
}

fn unglued(compact: &str) -> Vec<&str> {
    let long_enough = |stem: &&str| stem.chars().count() >= MIN_STEM_LEN;
    let prefixed = GLUED_PREFIXES.iter().filter_map(|prefix| compact.strip_prefix(prefix));
    let suffixed = GLUED_SUFFIXES.iter().filter_map(|suffix| compact.strip_suffix(suffix));
    prefixed.chain(suffixed).filter(long_enough).collect()
}

fn push_unique(variants: &mut Vec<String>, candidate: String, original: &str) {
    if candidate != original && !variants.contains(&candidate) {
        variants.push(candidate);
    }
}
