//! Runtime configuration.
//!
//! Every field has a default, so an empty or missing YAML file is a valid
//! configuration. Values are layered: defaults, then the YAML file, then
//! environment overrides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ports::FileSystem;

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "mangabridge.yaml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resolver thresholds and permutation inputs.
    pub resolver: ResolverConfig,
    /// Remote registry synchronisation.
    pub sync: SyncConfig,
    /// Redirect probing of unresolved sources.
    pub probe: ProbeConfig,
    /// Shared HTTP client settings.
    pub http: HttpConfig,
}

/// Tuning constants for the fuzzy resolver tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Minimum Jaccard score accepted by the token-overlap tier.
    pub token_threshold: f64,
    /// Minimum normalised similarity accepted by the edit-distance tier.
    pub edit_threshold: f64,
    /// Shortest consonant skeleton considered distinctive enough to match on.
    pub skeleton_min_len: usize,
    /// Bare language tags dropped from the end of a name when generating
    /// name permutations.
    pub language_tags: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            token_threshold: 0.6,
            edit_threshold: 0.85,
            skeleton_min_len: 3,
            language_tags: ["EN", "ID", "ES", "PT-BR", "FR", "RU"]
                .iter()
                .map(|tag| (*tag).to_string())
                .collect(),
        }
    }
}

/// Where and how the external registries are fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Set to `false` to resolve from the static tables only.
    pub enabled: bool,
    /// Extension index URLs, tried in order until one yields records.
    pub keiyoushi_urls: Vec<String>,
    /// Git tree listing of the parser repository.
    pub doki_tree_url: String,
    /// Prefix joined with a tree path to fetch a raw parser file.
    pub doki_raw_base: String,
    /// Language codes to keep from the extension index; empty keeps all.
    /// Multi-language extensions share one base URL, so keeping every
    /// language lets the last one listed claim the domain.
    pub languages: Vec<String>,
    /// Concurrent parser-file fetches.
    pub workers: usize,
    /// Timeout for index and tree requests, in seconds.
    pub timeout_secs: u64,
    /// Timeout for each parser-file request, in seconds.
    pub file_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keiyoushi_urls: vec![
                "https://raw.githubusercontent.com/keiyoushi/extensions/repo/index.min.json".into(),
                "https://raw.githubusercontent.com/keiyoushi/extensions/repo/index.json".into(),
                "https://raw.githubusercontent.com/keiyoushi/extensions/repo/index.html".into(),
            ],
            doki_tree_url:
                "https://api.github.com/repos/DokiTeam/doki-exts/git/trees/base?recursive=1".into(),
            doki_raw_base: "https://raw.githubusercontent.com/DokiTeam/doki-exts/base/".into(),
            languages: vec!["en".into(), "all".into()],
            workers: 20,
            timeout_secs: 20,
            file_timeout_secs: 10,
        }
    }
}

/// Redirect probing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Set to `false` to skip the probe pass entirely.
    pub enabled: bool,
    /// Concurrent probes.
    pub workers: usize,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { enabled: true, workers: 10, timeout_secs: 5 }
    }
}

/// HTTP client settings shared by sync and probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Token sent to `api.github.com` to lift the anonymous rate limit.
    pub github_token: Option<String>,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("mangabridge/", env!("CARGO_PKG_VERSION")).into(),
            github_token: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Exponential backoff for transient HTTP failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds; doubles on each retry.
    pub backoff_base_ms: u64,
    /// Status codes that trigger a retry.
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5, backoff_base_ms: 200, retry_statuses: vec![500, 502, 503, 504] }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1_u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }

    /// Returns `true` if a response with this status should be retried.
    #[must_use]
    pub fn should_retry(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }
}

impl Config {
    /// Loads configuration from an explicit path, or from
    /// [`DEFAULT_CONFIG_FILE`] if it exists, then applies environment
    /// overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly requested file is missing, or if a
    /// file exists but is not valid YAML.
    pub fn load(fs: &dyn FileSystem, path: Option<&Path>) -> Result<Self, String> {
        let mut config = match path {
            Some(path) => Self::from_file(fs, path)?,
            None if fs.exists(Path::new(DEFAULT_CONFIG_FILE)) => {
                Self::from_file(fs, Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parses a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(fs: &dyn FileSystem, path: &Path) -> Result<Self, String> {
        let content = fs
            .read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
        Self::from_yaml(&content)
            .map_err(|e| format!("Failed to parse config file {}: {e}", path.display()))
    }

    /// Parses configuration from a YAML string. Empty input yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or has mistyped fields.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// `MANGABRIDGE_GH_TOKEN` (or `GH_TOKEN`) sets the GitHub token;
    /// `MANGABRIDGE_OFFLINE=1` disables sync and probing.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let token = lookup("MANGABRIDGE_GH_TOKEN").or_else(|| lookup("GH_TOKEN"));
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.http.github_token = Some(token.trim().to_string());
        }
        if lookup("MANGABRIDGE_OFFLINE").is_some_and(|v| is_truthy(&v)) {
            self.go_offline();
        }
    }

    /// Disables every network phase.
    pub fn go_offline(&mut self) {
        self.sync.enabled = false;
        self.probe.enabled = false;
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
