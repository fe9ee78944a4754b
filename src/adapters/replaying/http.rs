//! Replaying adapter for the `HttpClient` port.

use std::sync::{Mutex, PoisonError};

use super::replay_result;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::{HttpClient, HttpFuture, HttpRequest, HttpResponse, Landing, PortError};

/// Serves recorded HTTP interactions from a cassette, matched by URL.
///
/// A request with no recorded interaction fails like an unreachable host
/// would, so sync and probe treat it as "no data".
pub struct ReplayingHttpClient {
    replayer: Option<Mutex<CassetteReplayer>>,
}

impl ReplayingHttpClient {
    /// Create a replaying HTTP client backed by the given replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Some(Mutex::new(replayer)) }
    }

    /// Create a replaying HTTP client with no cassette. Every request fails.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self { replayer: None }
    }

    fn output_for(&self, method: &str, request: &HttpRequest) -> Result<serde_json::Value, PortError> {
        let Some(replayer) = &self.replayer else {
            return Err(format!("no cassette loaded for http ({method} {})", request.url).into());
        };
        let mut replayer = replayer.lock().unwrap_or_else(PoisonError::into_inner);
        replayer
            .take_matching("http", method, |input| {
                input.get("url").and_then(serde_json::Value::as_str) == Some(request.url.as_str())
            })
            .map(|interaction| interaction.output.clone())
            .ok_or_else(|| format!("no recorded http::{method} for {}", request.url).into())
    }
}

impl HttpClient for ReplayingHttpClient {
    fn get_text(&self, request: &HttpRequest) -> HttpFuture<'_, HttpResponse> {
        let output = self.output_for("get_text", request);
        Box::pin(async move { replay_result(output?, "http::get_text") })
    }

    fn head(&self, request: &HttpRequest) -> HttpFuture<'_, Landing> {
        let output = self.output_for("head", request);
        Box::pin(async move { replay_result(output?, "http::head") })
    }

    fn get_landing(&self, request: &HttpRequest) -> HttpFuture<'_, Landing> {
        let output = self.output_for("get_landing", request);
        Box::pin(async move { replay_result(output?, "http::get_landing") })
    }
}
