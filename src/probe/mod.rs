//! Redirect probing for sources the resolver could not place.
//!
//! A retired source often still redirects to its new home. For each
//! unresolved entry with a usable URL, the prober follows the redirect
//! chain (HEAD first, GET when HEAD is refused or unsuccessful) and, if the
//! landing domain is a confirmed source, links the entry's name to it so
//! the next resolver pass picks it up by name.
//!
//! Probing is best effort. Transport errors, timeouts and non-2xx landings
//! all mean "no information" and are only logged at debug level.

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::config::ProbeConfig;
use crate::knowledge::SharedKnowledge;
use crate::normalize::canonical_domain;
use crate::ports::{HttpClient, HttpRequest};

/// An unresolved entry worth probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    /// Source name as written in the backup.
    pub name: String,
    /// Source URL as written in the backup.
    pub url: String,
}

/// Concurrent redirect prober.
#[derive(Debug, Clone)]
pub struct Prober {
    workers: usize,
    timeout_secs: u64,
}

impl Prober {
    /// Creates a prober from configuration.
    #[must_use]
    pub fn new(config: &ProbeConfig) -> Self {
        Self { workers: config.workers.max(1), timeout_secs: config.timeout_secs }
    }

    /// Probes every target and links discoveries into `kb`.
    ///
    /// Targets without an absolute or host-like URL are skipped. Returns
    /// the number of names newly linked.
    pub async fn probe(
        &self,
        http: &dyn HttpClient,
        targets: &[ProbeTarget],
        kb: &SharedKnowledge,
    ) -> usize {
        let timeout_secs = self.timeout_secs;
        let outcomes: Vec<bool> = stream::iter(targets)
            .filter_map(|target| async move { probe_url(&target.url).map(|url| (target, url)) })
            .map(|(target, url)| async move {
                let Some(final_url) = land(http, &url, timeout_secs).await else {
                    return false;
                };
                let Some(record) = canonical_domain(&final_url).and_then(|d| kb.domain(&d)) else {
                    debug!(url = %url, landed = %final_url, "landing domain is not a known source");
                    return false;
                };
                debug!(name = %target.name, landed = %final_url, id = record.id, "linked by redirect");
                kb.link_name(&target.name, &record)
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;

        let linked = outcomes.iter().filter(|linked| **linked).count();
        info!(probed = outcomes.len(), linked, "probe finished");
        linked
    }
}

/// Follows `url` and returns where it landed, if the landing was 2xx.
async fn land(http: &dyn HttpClient, url: &str, timeout_secs: u64) -> Option<String> {
    let request = HttpRequest::new(url, timeout_secs);
    match http.head(&request).await {
        Ok(landing) if landing.is_success() => return Some(landing.final_url),
        Ok(landing) => debug!(url, status = landing.status, "HEAD unsuccessful, retrying with GET"),
        Err(err) => debug!(url, error = %err, "HEAD failed, retrying with GET"),
    }
    match http.get_landing(&request).await {
        Ok(landing) if landing.is_success() => Some(landing.final_url),
        Ok(landing) => {
            debug!(url, status = landing.status, "GET unsuccessful");
            None
        }
        Err(err) => {
            debug!(url, error = %err, "GET failed");
            None
        }
    }
}

/// Turns a backup URL into something requestable.
///
/// `http(s)` URLs pass through, protocol-relative and bare-host URLs get
/// `https:`, and relative paths or other schemes yield `None`.
fn probe_url(raw: &str) -> Option<String> {
    let url = raw.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        return Some(url.to_string());
    }
    if let Some(rest) = url.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    if url.is_empty() || url.starts_with('/') || url.contains("://") {
        return None;
    }
    let host = url.split(['/', '?', '#']).next().unwrap_or_default();
    host.contains('.').then(|| format!("https://{url}"))
}
