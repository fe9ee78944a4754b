//! HTTP port used by registry sync and redirect probing.

use std::error::Error;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

/// Error type returned across port boundaries.
pub type PortError = Box<dyn Error + Send + Sync>;

/// Boxed future type alias used by [`HttpClient`] to keep the trait dyn-compatible.
pub type HttpFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PortError>> + Send + 'a>>;

/// A GET or HEAD request. Redirects are always followed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// Absolute request URL.
    pub url: String,
    /// Timeout for the whole request, in seconds.
    pub timeout_secs: u64,
}

impl HttpRequest {
    /// Creates a request for `url` with the given timeout.
    #[must_use]
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Self {
        Self { url: url.into(), timeout_secs }
    }
}

/// A response with its body read as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// Final status code after redirects.
    pub status: u16,
    /// URL the redirect chain ended at.
    pub final_url: String,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Returns `true` for a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Where a redirect chain ended, without the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Landing {
    /// Final status code after redirects.
    pub status: u16,
    /// URL the redirect chain ended at.
    pub final_url: String,
}

impl Landing {
    /// Returns `true` for a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs outbound HTTP requests.
pub trait HttpClient: Send + Sync {
    /// Fetches a URL and reads the body as text.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or timeout. Non-2xx statuses
    /// are returned as responses, not errors.
    fn get_text(&self, request: &HttpRequest) -> HttpFuture<'_, HttpResponse>;

    /// Issues a HEAD request and reports where it landed.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or timeout.
    fn head(&self, request: &HttpRequest) -> HttpFuture<'_, Landing>;

    /// Issues a GET request, reports where it landed, and drops the body
    /// unread.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or timeout.
    fn get_landing(&self, request: &HttpRequest) -> HttpFuture<'_, Landing>;
}
