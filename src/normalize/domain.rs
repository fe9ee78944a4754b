//! Domain canonicalisation.

use url::Url;

/// Leading host labels that never distinguish one source from another.
const STRIPPED_PREFIXES: &[&str] = &["www", "api", "m", "v1", "v2", "read", "images"];

/// Reduces a URL or bare hostname to its canonical domain.
///
/// Adds `https://` when no scheme is present, lowercases the host, drops the
/// port, and strips leading labels such as `www.` or `m.` while at least two
/// labels remain. Relative paths, empty input, and anything the URL parser
/// rejects yield `None`.
#[must_use]
pub fn canonical_domain(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() || trimmed.starts_with(['?', '#']) {
        return None;
    }

    let absolute = if has_scheme(trimmed) {
        trimmed.to_string()
    } else if let Some(rest) = trimmed.strip_prefix("//") {
        format!("https://{rest}")
    } else if trimmed.starts_with('/') {
        return None;
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&absolute).ok()?;
    let host = parsed.host_str()?.trim_end_matches('.').to_lowercase();
    if host.is_empty() {
        return None;
    }

    Some(strip_prefixes(&host).to_string())
}

fn has_scheme(value: &str) -> bool {
    value.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

fn strip_prefixes(host: &str) -> &str {
    let mut current = host;
    while let Some((label, rest)) = current.split_once('.') {
        if !rest.contains('.') || !is_stripped_label(label) {
            break;
        }
        current = rest;
    }
    current
}

fn is_stripped_label(label: &str) -> bool {
    if STRIPPED_PREFIXES.contains(&label) {
        return true;
    }
    // Versioned API hosts: v3., v10., ...
    label
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}
