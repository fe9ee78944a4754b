//! Keiyoushi extension index.
//!
//! The index is published as JSON (`[{lang, sources: [{id, name, baseUrl,
//! lang}]}]`) and as an HTML table. Ids in the JSON are sometimes strings
//! and sometimes numbers, and may exceed `i64::MAX`; all of them go through
//! [`parse_registry_id`].

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::ids::parse_registry_id;
use crate::knowledge::SharedKnowledge;
use crate::ports::{HttpClient, HttpRequest};

static ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<tr[^>]*>.*?</tr>").expect("table row pattern to compile")
});
static ROW_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"class="name"[^>]*>(.*?)<"#).expect("row name pattern to compile")
});
static ROW_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-id="(-?\d+)""#).expect("row id pattern to compile"));

/// One source listed in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSource {
    /// Signed 64-bit id, if the listing carried a usable one.
    pub id: Option<i64>,
    /// Display name.
    pub name: String,
    /// Base URL, absent in the HTML listing.
    pub base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Extension {
    #[serde(default)]
    lang: String,
    #[serde(default)]
    sources: Vec<RawSource>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    id: Option<RawId>,
    #[serde(default)]
    name: String,
    #[serde(rename = "baseUrl")]
    base_url: Option<String>,
    lang: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl RawId {
    fn parse(&self) -> Option<i64> {
        match self {
            Self::Text(text) => parse_registry_id(text),
            Self::Number(number) if number.is_f64() => {
                warn!(id = %number, "dropping numeric source id that is not an exact integer");
                None
            }
            Self::Number(number) => parse_registry_id(&number.to_string()),
        }
    }
}

/// Fetches the index and registers every listed source.
///
/// URLs are tried in order and the first one that yields any sources wins.
/// Returns the number of sources registered; failures only cost knowledge.
pub async fn sync(http: &dyn HttpClient, config: &SyncConfig, kb: &SharedKnowledge) -> usize {
    for url in &config.keiyoushi_urls {
        let Some(sources) = fetch(http, url, config).await else {
            continue;
        };
        if sources.is_empty() {
            debug!(url = %url, "index listed no sources");
            continue;
        }

        let registered = sources
            .iter()
            .filter(|source| kb.register(source.id, &source.name, source.base_url.as_deref()))
            .count();
        info!(url = %url, registered, "synced extension index");
        return registered;
    }
    warn!("no extension index could be read");
    0
}

async fn fetch(http: &dyn HttpClient, url: &str, config: &SyncConfig) -> Option<Vec<IndexSource>> {
    let response = match http.get_text(&HttpRequest::new(url, config.timeout_secs)).await {
        Ok(response) if response.is_success() => response,
        Ok(response) => {
            warn!(url, status = response.status, "extension index unavailable");
            return None;
        }
        Err(err) => {
            warn!(url, error = %err, "failed to fetch extension index");
            return None;
        }
    };

    if is_html(url, &response.body) {
        return Some(parse_html(&response.body));
    }
    match parse_json(&response.body, &config.languages) {
        Ok(sources) => Some(sources),
        Err(err) => {
            warn!(url, error = %err, "extension index is not valid JSON");
            None
        }
    }
}

fn is_html(url: &str, body: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.ends_with(".html") || body.trim_start().starts_with('<')
}

/// Parses the JSON index, keeping sources whose language is in `languages`.
///
/// An empty `languages` keeps everything; sources tagged `all` are always
/// kept. A source without its own language inherits its extension's.
///
/// # Errors
///
/// Returns an error if `body` is not a JSON index.
pub fn parse_json(body: &str, languages: &[String]) -> Result<Vec<IndexSource>, serde_json::Error> {
    let extensions: Vec<Extension> = serde_json::from_str(body)?;
    let wanted = |lang: &str| {
        languages.is_empty()
            || lang.eq_ignore_ascii_case("all")
            || languages.iter().any(|l| l.eq_ignore_ascii_case(lang))
    };

    Ok(extensions
        .into_iter()
        .flat_map(|ext| {
            let ext_lang = ext.lang;
            ext.sources.into_iter().filter_map(move |source| {
                let lang = source.lang.as_deref().unwrap_or(&ext_lang);
                wanted(lang).then(|| IndexSource {
                    id: source.id.as_ref().and_then(RawId::parse),
                    name: source.name.trim().to_string(),
                    base_url: source.base_url,
                })
            })
        })
        .collect())
}

/// Scrapes `data-id` and `class="name"` out of each table row.
#[must_use]
pub fn parse_html(body: &str) -> Vec<IndexSource> {
    let sources: Vec<IndexSource> = ROW
        .find_iter(body)
        .filter_map(|row| {
            let row = row.as_str();
            let name = ROW_NAME.captures(row)?.get(1)?.as_str().trim().to_string();
            let id = parse_registry_id(ROW_ID.captures(row)?.get(1)?.as_str())?;
            Some(IndexSource { id: Some(id), name, base_url: None })
        })
        .collect();
    debug!(count = sources.len(), "scraped HTML index rows");
    sources
}
