//! Doki parser repository scan.
//!
//! The exporting app names sources by parser key (`ASURASCANS_EN`), which
//! the target registry never uses. Each parser's Kotlin source declares its
//! key, display title and domain, so scanning the repository yields
//! key → domain aliases that the extension index can later confirm.

use std::sync::LazyLock;

use futures::stream::{self, StreamExt};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::ids::parse_registry_id;
use crate::knowledge::SharedKnowledge;
use crate::ports::{HttpClient, HttpRequest};

static ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@MangaSourceParser\(\s*"([^"]+)"\s*,\s*"([^"]+)""#)
        .expect("parser annotation pattern to compile")
});
static NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"override\s+val\s+name\s*=\s*"([^"]+)"|super\(\s*"([^"]+)""#)
        .expect("parser name pattern to compile")
});
static CONFIG_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"ConfigKey\.Domain\(\s*"([^"]+)""#).expect("config domain pattern to compile")
});
static BASE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"val\s+baseUrl\s*=\s*"([^"]+)""#).expect("base url pattern to compile")
});
static URL_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(https?://[^"]+)""#).expect("url literal pattern to compile"));
static ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"val\s+id\s*=\s*(-?\d+)L?").expect("id pattern to compile"));

/// What one parser file declares about its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserMeta {
    /// Parser key, such as `ASURASCANS_EN`.
    pub key: Option<String>,
    /// Display title, or the file stem when none is declared.
    pub title: String,
    /// Domain or base URL.
    pub domain: Option<String>,
    /// Explicit numeric id.
    pub id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Tree {
    #[serde(default)]
    tree: Vec<TreeEntry>,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
}

/// Scans the parser repository and feeds what it finds into `kb`.
///
/// Returns the number of parsers learned from. Files are registered in
/// path order regardless of fetch order, so repeated scans of the same tree
/// leave the same knowledge behind.
pub async fn sync(http: &dyn HttpClient, config: &SyncConfig, kb: &SharedKnowledge) -> usize {
    let Some(paths) = list_parsers(http, config).await else {
        return 0;
    };
    debug!(files = paths.len(), "scanning parser sources");

    let timeout_secs = config.file_timeout_secs;
    let mut found: Vec<(String, ParserMeta)> = stream::iter(paths)
        .map(|path| async move {
            let url = format!("{}{path}", config.doki_raw_base);
            let source = match http.get_text(&HttpRequest::new(&url, timeout_secs)).await {
                Ok(response) if response.is_success() => response.body,
                Ok(response) => {
                    debug!(url = %url, status = response.status, "parser file unavailable");
                    return None;
                }
                Err(err) => {
                    debug!(url = %url, error = %err, "failed to fetch parser file");
                    return None;
                }
            };
            extract(&source, &path).map(|meta| (path, meta))
        })
        .buffer_unordered(config.workers.max(1))
        .filter_map(|found| async move { found })
        .collect()
        .await;
    found.sort_by(|a, b| a.0.cmp(&b.0));

    let learned = found.iter().filter(|(_, meta)| learn(kb, meta)).count();
    info!(learned, "synced parser repository");
    learned
}

async fn list_parsers(http: &dyn HttpClient, config: &SyncConfig) -> Option<Vec<String>> {
    let request = HttpRequest::new(&config.doki_tree_url, config.timeout_secs);
    let body = match http.get_text(&request).await {
        Ok(response) if response.is_success() => response.body,
        Ok(response) => {
            warn!(url = %request.url, status = response.status, "parser tree unavailable");
            return None;
        }
        Err(err) => {
            warn!(url = %request.url, error = %err, "failed to fetch parser tree");
            return None;
        }
    };

    match serde_json::from_str::<Tree>(&body) {
        Ok(tree) => Some(
            tree.tree
                .into_iter()
                .map(|entry| entry.path)
                .filter(|path| path.ends_with(".kt") && path.contains("src/main/kotlin"))
                .collect(),
        ),
        Err(err) => {
            warn!(url = %request.url, error = %err, "parser tree is not valid JSON");
            None
        }
    }
}

fn learn(kb: &SharedKnowledge, meta: &ParserMeta) -> bool {
    let mut learned = false;
    if let Some(domain) = meta.domain.as_deref() {
        if let Some(key) = meta.key.as_deref() {
            learned |= kb.add_alias(key, domain);
        }
        learned |= kb.add_alias(&meta.title, domain);
    }
    if meta.id.is_some() {
        learned |= kb.register(meta.id, &meta.title, meta.domain.as_deref());
    }
    learned
}

/// Pulls source metadata out of a Kotlin parser file.
///
/// Returns `None` when the file declares neither a domain nor an id.
#[must_use]
pub fn extract(source: &str, path: &str) -> Option<ParserMeta> {
    let first = |re: &Regex| -> Option<String> {
        let captures = re.captures(source)?;
        captures.iter().skip(1).flatten().next().map(|m| m.as_str().trim().to_string())
    };

    let (key, title) = match ANNOTATION.captures(source) {
        Some(captures) => (
            captures.get(1).map(|m| m.as_str().to_string()),
            captures.get(2).map(|m| m.as_str().trim().to_string()),
        ),
        None => (None, None),
    };
    let title = title.or_else(|| first(&NAME)).unwrap_or_else(|| file_stem(path).to_string());
    let domain = first(&CONFIG_DOMAIN).or_else(|| first(&BASE_URL)).or_else(|| first(&URL_LITERAL));
    let id = first(&ID).as_deref().and_then(parse_registry_id);

    if domain.is_none() && id.is_none() {
        return None;
    }
    Some(ParserMeta { key, title, domain, id })
}

fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.strip_suffix(".kt").unwrap_or(name)
}
