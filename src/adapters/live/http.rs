//! Live adapter for the `HttpClient` port using `reqwest`.

use std::time::Duration;

use reqwest::{Client, Method, Response};
use tracing::debug;
use url::Url;

use crate::config::{HttpConfig, RetryPolicy};
use crate::ports::{HttpClient, HttpFuture, HttpRequest, HttpResponse, Landing, PortError};

/// Longest redirect chain followed before giving up.
const MAX_REDIRECTS: usize = 10;

/// Host that receives the GitHub token.
const GITHUB_API_HOST: &str = "api.github.com";

/// Live HTTP client with redirect following and retry/backoff.
#[derive(Debug, Clone)]
pub struct LiveHttpClient {
    client: Client,
    github_token: Option<String>,
    retry: RetryPolicy,
}

impl LiveHttpClient {
    /// Creates a client from HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(config: &HttpConfig) -> Result<Self, PortError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client, github_token: config.github_token.clone(), retry: config.retry.clone() })
    }

    /// Sends a request, retrying connection failures and retryable statuses.
    async fn send(&self, method: Method, request: &HttpRequest) -> Result<Response, PortError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let mut builder = self
                .client
                .request(method.clone(), &request.url)
                .timeout(Duration::from_secs(request.timeout_secs));
            if let Some(token) = self.github_token.as_deref().filter(|_| is_github_api(&request.url))
            {
                builder = builder.bearer_auth(token);
            }

            match builder.send().await {
                Ok(response)
                    if attempt < max_attempts
                        && self.retry.should_retry(response.status().as_u16()) =>
                {
                    debug!(url = %request.url, status = response.status().as_u16(), attempt, "retrying");
                }
                Ok(response) => return Ok(response),
                Err(err) if attempt < max_attempts && err.is_connect() => {
                    debug!(url = %request.url, error = %err, attempt, "retrying");
                }
                Err(err) => return Err(format!("{method} {} failed: {err}", request.url).into()),
            }

            tokio::time::sleep(self.retry.delay(attempt)).await;
            attempt += 1;
        }
    }

    async fn landing(&self, method: Method, request: &HttpRequest) -> Result<Landing, PortError> {
        let response = self.send(method, request).await?;
        Ok(Landing { status: response.status().as_u16(), final_url: response.url().to_string() })
    }
}

impl HttpClient for LiveHttpClient {
    fn get_text(&self, request: &HttpRequest) -> HttpFuture<'_, HttpResponse> {
        let request = request.clone();
        Box::pin(async move {
            let response = self.send(Method::GET, &request).await?;
            let status = response.status().as_u16();
            let final_url = response.url().to_string();
            let body = response.text().await.map_err(|e| -> PortError {
                format!("Failed to read response body from {}: {e}", request.url).into()
            })?;
            Ok(HttpResponse { status, final_url, body })
        })
    }

    fn head(&self, request: &HttpRequest) -> HttpFuture<'_, Landing> {
        let request = request.clone();
        Box::pin(async move { self.landing(Method::HEAD, &request).await })
    }

    fn get_landing(&self, request: &HttpRequest) -> HttpFuture<'_, Landing> {
        let request = request.clone();
        Box::pin(async move { self.landing(Method::GET, &request).await })
    }
}

fn is_github_api(url: &str) -> bool {
    Url::parse(url).ok().is_some_and(|u| u.host_str() == Some(GITHUB_API_HOST))
}
