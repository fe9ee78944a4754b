//! In-process adapters: a filesystem and an HTTP client backed by maps, and
//! a frozen clock.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

use crate::ports::{
    Clock, FileSystem, HttpClient, HttpFuture, HttpRequest, HttpResponse, Landing, PortError,
};

/// Filesystem held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
}

impl MemoryFileSystem {
    /// Creates an empty filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file.
    pub fn insert(&self, path: impl Into<PathBuf>, contents: Vec<u8>) {
        self.files.lock().unwrap_or_else(PoisonError::into_inner).insert(path.into(), contents);
    }

    /// Returns a copy of a file's contents.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner).get(path).cloned()
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, PortError> {
        self.get(path).ok_or_else(|| format!("{}: no such file", path.display()).into())
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), PortError> {
        self.insert(path, contents.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap_or_else(PoisonError::into_inner).contains_key(path)
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A canned response for one URL.
#[derive(Debug, Clone)]
struct Route {
    status: u16,
    final_url: String,
    body: String,
    head_allowed: bool,
}

/// HTTP client answering from a table of canned routes.
///
/// URLs without a route fail like a refused connection. Every request URL
/// is logged in arrival order.
#[derive(Debug, Default)]
pub struct MemoryHttpClient {
    routes: Mutex<BTreeMap<String, Route>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryHttpClient {
    /// Creates a client with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` with status 200 at `url`.
    #[must_use]
    pub fn serve(self, url: &str, body: impl Into<String>) -> Self {
        self.route(url, Route { status: 200, final_url: url.into(), body: body.into(), head_allowed: true })
    }

    /// Redirects `from` to `to`, which answers 200 with an empty body.
    #[must_use]
    pub fn redirect(self, from: &str, to: &str) -> Self {
        self.route(from, Route { status: 200, final_url: to.into(), body: String::new(), head_allowed: true })
    }

    /// Answers `url` with a bare status code.
    #[must_use]
    pub fn status(self, url: &str, status: u16) -> Self {
        self.route(url, Route { status, final_url: url.into(), body: String::new(), head_allowed: true })
    }

    /// Makes HEAD requests to an existing route fail while GET still works.
    #[must_use]
    pub fn refuse_head(self, url: &str) -> Self {
        if let Some(route) = self.routes.lock().unwrap_or_else(PoisonError::into_inner).get_mut(url) {
            route.head_allowed = false;
        }
        self
    }

    /// Request URLs seen so far, prefixed with the method.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn route(self, url: &str, route: Route) -> Self {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner).insert(url.into(), route);
        self
    }

    fn lookup(&self, method: &str, request: &HttpRequest) -> Result<Route, PortError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{method} {}", request.url));
        let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        match routes.get(&request.url) {
            Some(route) if method != "HEAD" || route.head_allowed => Ok(route.clone()),
            Some(_) => Err(format!("HEAD {} not allowed", request.url).into()),
            None => Err(format!("connection refused: {}", request.url).into()),
        }
    }
}

impl HttpClient for MemoryHttpClient {
    fn get_text(&self, request: &HttpRequest) -> HttpFuture<'_, HttpResponse> {
        let result = self.lookup("GET", request).map(|route| HttpResponse {
            status: route.status,
            final_url: route.final_url,
            body: route.body,
        });
        Box::pin(async move { result })
    }

    fn head(&self, request: &HttpRequest) -> HttpFuture<'_, Landing> {
        let result = self
            .lookup("HEAD", request)
            .map(|route| Landing { status: route.status, final_url: route.final_url });
        Box::pin(async move { result })
    }

    fn get_landing(&self, request: &HttpRequest) -> HttpFuture<'_, Landing> {
        let result = self
            .lookup("GET", request)
            .map(|route| Landing { status: route.status, final_url: route.final_url });
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_filesystem_round_trips_files() {
        let fs = MemoryFileSystem::new();
        assert!(!fs.exists(Path::new("a.txt")));
        fs.write(Path::new("a.txt"), b"hello").unwrap();
        assert!(fs.exists(Path::new("a.txt")));
        assert_eq!(fs.read_to_string(Path::new("a.txt")).unwrap(), "hello");
        assert!(fs.read_bytes(Path::new("b.txt")).is_err());
    }

    #[test]
    fn invalid_utf8_is_an_error_for_text_reads() {
        let fs = MemoryFileSystem::new();
        fs.insert("bin", vec![0xff, 0xfe]);
        assert!(fs.read_to_string(Path::new("bin")).is_err());
        assert_eq!(fs.read_bytes(Path::new("bin")).unwrap(), vec![0xff, 0xfe]);
    }

    #[tokio::test]
    async fn memory_http_serves_routes_and_refuses_the_rest() {
        let http = MemoryHttpClient::new()
            .serve("https://a.example/", "hello")
            .redirect("https://old.example/", "https://new.example/")
            .refuse_head("https://old.example/");

        let page = http.get_text(&HttpRequest::new("https://a.example/", 5)).await.unwrap();
        assert_eq!(page.body, "hello");
        assert!(http.head(&HttpRequest::new("https://old.example/", 5)).await.is_err());
        let landing = http.get_landing(&HttpRequest::new("https://old.example/", 5)).await.unwrap();
        assert_eq!(landing.final_url, "https://new.example/");
        assert!(http.get_text(&HttpRequest::new("https://nowhere.example/", 5)).await.is_err());
        assert_eq!(http.requests().len(), 4);
    }
}
