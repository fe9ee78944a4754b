//! Recording adapter for the `HttpClient` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{HttpClient, HttpFuture, HttpRequest, HttpResponse, Landing};

/// Records HTTP interactions while delegating to an inner implementation.
pub struct RecordingHttpClient {
    inner: Box<dyn HttpClient>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingHttpClient {
    /// Creates a new recording HTTP client wrapping the given implementation.
    pub fn new(inner: Box<dyn HttpClient>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl HttpClient for RecordingHttpClient {
    fn get_text(&self, request: &HttpRequest) -> HttpFuture<'_, HttpResponse> {
        let request = request.clone();
        Box::pin(async move {
            let result = self.inner.get_text(&request).await;
            record_result(&self.recorder, "http", "get_text", &request, &result);
            result
        })
    }

    fn head(&self, request: &HttpRequest) -> HttpFuture<'_, Landing> {
        let request = request.clone();
        Box::pin(async move {
            let result = self.inner.head(&request).await;
            record_result(&self.recorder, "http", "head", &request, &result);
            result
        })
    }

    fn get_landing(&self, request: &HttpRequest) -> HttpFuture<'_, Landing> {
        let request = request.clone();
        Box::pin(async move {
            let result = self.inner.get_landing(&request).await;
            record_result(&self.recorder, "http", "get_landing", &request, &result);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::replaying::ReplayingHttpClient;
    use crate::cassette::format::Cassette;
    use crate::cassette::replayer::CassetteReplayer;
    use chrono::Utc;

    #[tokio::test]
    async fn records_successes_and_failures() {
        let dir = std::env::temp_dir().join("mangabridge_rec_http_test");
        let path = dir.join("http.cassette.yaml");

        let source = Cassette {
            name: "source".into(),
            recorded_at: Utc::now(),
            commit: "abc".into(),
            interactions: vec![crate::cassette::format::Interaction {
                seq: 0,
                port: "http".into(),
                method: "head".into(),
                input: serde_json::json!({"url": "https://old.example/", "timeout_secs": 5}),
                output: serde_json::json!({"Ok": {"status": 200, "final_url": "https://new.example/"}}),
            }],
        };
        let inner = ReplayingHttpClient::new(CassetteReplayer::new(&source));
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, "rec", "abc")));

        {
            let client = RecordingHttpClient::new(Box::new(inner), Arc::clone(&recorder));
            let landing = client.head(&HttpRequest::new("https://old.example/", 5)).await.unwrap();
            assert_eq!(landing.final_url, "https://new.example/");
            assert!(client.head(&HttpRequest::new("https://unknown.example/", 5)).await.is_err());
        }

        let recorder = Arc::try_unwrap(recorder).unwrap().into_inner().unwrap();
        recorder.finish().unwrap();
        let cassette = Cassette::from_yaml(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(cassette.interactions.len(), 2);
        assert_eq!(cassette.interactions[0].output["Ok"]["status"], 200);
        assert!(cassette.interactions[1].output["Err"].is_string());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
