//! `clawmem-client` – HTTP client for the clawmem storage worker.
//!
//! The worker is a separate process that owns persistence and full-text
//! search.  [`WorkerClient`] speaks its JSON API and implements
//! [`ObservationStore`] so the capture pipeline and the runtime hooks can
//! use it without knowing about HTTP.
//!
//! # Endpoints
//!
//! | method | path | timeout |
//! |---|---|---|
//! | `GET` | `/api/health` | 2 s |
//! | `POST` | `/api/search` | 5 s |
//! | `POST` | `/api/sessions` | 5 s |
//! | `POST` | `/api/observations` | 5 s |
//! | `GET` | `/api/observations/{id}` | 5 s |
//! | `DELETE` | `/api/observations/{id}` | 5 s |
//! | `GET` | `/api/stats` | 5 s |
//!
//! # Example
//!
//! ```rust,no_run
//! use clawmem_client::WorkerClient;
//!
//! # async fn run() {
//! let client = WorkerClient::new("http://127.0.0.1:37778");
//! if client.health().await {
//!     let hits = client.search("caching layer", 5).await.unwrap_or_default();
//!     println!("{} hits", hits.len());
//! }
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use clawmem_types::{MemError, MemoryStats, Observation, ObservationDraft, ObservationStore};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default worker address.
pub const DEFAULT_WORKER_URL: &str = "http://127.0.0.1:37778";

/// Timeout for the liveness probe.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Timeout for every other request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can arise from worker requests.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request could not be sent or its body could not be decoded.
    #[error("{operation} request error: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// The worker answered with a non-success status.
    #[error("{operation} failed: {status}")]
    Status { operation: &'static str, status: u16 },
    #[error("memory #{0} not found")]
    NotFound(i64),
}

impl From<ClientError> for MemError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http { operation, source } if source.is_timeout() => {
                MemError::Timeout(operation)
            }
            ClientError::Http { source, .. } if source.is_connect() => {
                MemError::Unavailable(source.to_string())
            }
            ClientError::Http { source, .. } if source.is_decode() => {
                MemError::BadResponse(source.to_string())
            }
            ClientError::Http { source, .. } => MemError::Transport(source.to_string()),
            ClientError::Status { operation, status } => {
                MemError::RequestFailed { operation, status }
            }
            ClientError::NotFound(id) => MemError::NotFound(id),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire shapes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    limit: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<Observation>,
}

#[derive(Serialize)]
struct SessionRequest<'a> {
    session_key: &'a str,
}

// ─────────────────────────────────────────────────────────────────────────────
// WorkerClient
// ─────────────────────────────────────────────────────────────────────────────

/// Async client for the storage worker.
///
/// Cheap to clone; construct once and share.
#[derive(Debug, Clone)]
pub struct WorkerClient {
    base_url: String,
    health_timeout: Duration,
    request_timeout: Duration,
    client: reqwest::Client,
}

impl WorkerClient {
    /// Create a client for the worker at `base_url` (e.g. `"http://127.0.0.1:37778"`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            health_timeout: HEALTH_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
            client: reqwest::Client::new(),
        }
    }

    /// Override the per-request timeouts.
    pub fn with_timeouts(mut self, health: Duration, request: Duration) -> Self {
        self.health_timeout = health;
        self.request_timeout = request;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `true` when the worker answers its health endpoint with a success
    /// status within [`HEALTH_TIMEOUT`].  Never fails.
    pub async fn health(&self) -> bool {
        match self
            .client
            .get(self.url("/api/health"))
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "worker health probe failed");
                false
            }
        }
    }

    /// Full-text search, most relevant first.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Observation>, ClientError> {
        const OP: &str = "Search";
        let response = self
            .client
            .post(self.url("/api/search"))
            .timeout(self.request_timeout)
            .json(&SearchRequest { query, limit })
            .send()
            .await
            .map_err(|source| http(OP, source))?;
        let body: SearchResponse = ensure_success(OP, response)?
            .json()
            .await
            .map_err(|source| http(OP, source))?;
        Ok(body.results)
    }

    /// Store an observation, creating its session first.
    ///
    /// The session call is idempotent on the worker side; its status is not
    /// checked, only transport failures abort.
    pub async fn store(&self, draft: &ObservationDraft) -> Result<Observation, ClientError> {
        const OP: &str = "Store";
        let session = self
            .client
            .post(self.url("/api/sessions"))
            .timeout(self.request_timeout)
            .json(&SessionRequest { session_key: &draft.session_key })
            .send()
            .await
            .map_err(|source| http(OP, source))?;
        if !session.status().is_success() {
            debug!(status = session.status().as_u16(), "session upsert returned non-success");
        }

        let response = self
            .client
            .post(self.url("/api/observations"))
            .timeout(self.request_timeout)
            .json(draft)
            .send()
            .await
            .map_err(|source| http(OP, source))?;
        ensure_success(OP, response)?
            .json()
            .await
            .map_err(|source| http(OP, source))
    }

    /// Fetch an observation; `Ok(None)` on 404.
    pub async fn get(&self, id: i64) -> Result<Option<Observation>, ClientError> {
        const OP: &str = "Get";
        let response = self
            .client
            .get(self.url(&format!("/api/observations/{id}")))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|source| http(OP, source))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let observation = ensure_success(OP, response)?
            .json()
            .await
            .map_err(|source| http(OP, source))?;
        Ok(Some(observation))
    }

    /// Delete an observation; [`ClientError::NotFound`] on 404.
    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        const OP: &str = "Delete";
        let response = self
            .client
            .delete(self.url(&format!("/api/observations/{id}")))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|source| http(OP, source))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(id));
        }
        ensure_success(OP, response)?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<MemoryStats, ClientError> {
        const OP: &str = "Stats";
        let response = self
            .client
            .get(self.url("/api/stats"))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|source| http(OP, source))?;
        ensure_success(OP, response)?
            .json()
            .await
            .map_err(|source| http(OP, source))
    }
}

fn http(operation: &'static str, source: reqwest::Error) -> ClientError {
    ClientError::Http { operation, source }
}

fn ensure_success(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Status {
            operation,
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl ObservationStore for WorkerClient {
    async fn health(&self) -> bool {
        WorkerClient::health(self).await
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Observation>, MemError> {
        Ok(WorkerClient::search(self, query, limit).await?)
    }

    async fn store(&self, draft: ObservationDraft) -> Result<Observation, MemError> {
        Ok(WorkerClient::store(self, &draft).await?)
    }

    async fn get(&self, id: i64) -> Result<Option<Observation>, MemError> {
        Ok(WorkerClient::get(self, id).await?)
    }

    async fn delete(&self, id: i64) -> Result<(), MemError> {
        Ok(WorkerClient::delete(self, id).await?)
    }

    async fn stats(&self) -> Result<MemoryStats, MemError> {
        Ok(WorkerClient::stats(self).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn observation_json(id: i64, kind: &str, summary: &str) -> serde_json::Value {
        json!({
            "id": id,
            "session_id": 1,
            "type": kind,
            "tool_name": null,
            "input": null,
            "output": summary,
            "summary": summary,
            "created_at": "2026-03-01T10:00:00Z",
            "importance": 5
        })
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = WorkerClient::new("http://localhost:37778/");
        assert_eq!(client.base_url(), "http://localhost:37778");
        assert_eq!(client.url("/api/health"), "http://localhost:37778/api/health");
    }

    #[tokio::test]
    async fn health_reports_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&server)
            .await;
        assert!(WorkerClient::new(server.uri()).health().await);
    }

    #[tokio::test]
    async fn health_is_false_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        assert!(!WorkerClient::new(server.uri()).health().await);
    }

    #[tokio::test]
    async fn health_is_false_when_unreachable() {
        // Port 9 (discard) is essentially never served on test hosts.
        let client = WorkerClient::new("http://127.0.0.1:9")
            .with_timeouts(Duration::from_millis(300), Duration::from_millis(300));
        assert!(!client.health().await);
    }

    #[tokio::test]
    async fn health_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;
        let client = WorkerClient::new(server.uri())
            .with_timeouts(Duration::from_millis(50), Duration::from_millis(50));
        assert!(!client.health().await);
    }

    #[tokio::test]
    async fn search_posts_query_and_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .and(body_json(json!({"query": "caching layer", "limit": 5})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    observation_json(2, "decision", "use redis"),
                    observation_json(1, "bugfix", "fixed eviction")
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let results = WorkerClient::new(server.uri()).search("caching layer", 5).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, 2);
        assert_eq!(results[1].kind, "bugfix");
    }

    #[tokio::test]
    async fn search_accepts_fractional_importance() {
        let server = MockServer::start().await;
        let mut weighted = observation_json(3, "decision", "use sqlite");
        weighted["importance"] = json!(7.5);
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"results": [weighted, observation_json(1, "bugfix", "fixed eviction")]})),
            )
            .mount(&server)
            .await;

        let results = WorkerClient::new(server.uri()).search("storage", 5).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].importance, 7.5);
        assert_eq!(results[1].importance, 5.0);
    }

    #[tokio::test]
    async fn search_error_status_is_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let err = WorkerClient::new(server.uri()).search("x", 1).await.unwrap_err();
        assert_eq!(err.to_string(), "Search failed: 500");
        assert_eq!(
            MemError::from(err),
            MemError::RequestFailed { operation: "Search", status: 500 }
        );
    }

    #[tokio::test]
    async fn search_with_malformed_body_is_bad_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        let err = WorkerClient::new(server.uri()).search("x", 1).await.unwrap_err();
        assert!(matches!(MemError::from(err), MemError::BadResponse(_)));
    }

    #[tokio::test]
    async fn store_creates_session_before_observation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .and(body_json(json!({"session_key": "agent:main"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/observations"))
            .and(body_json(json!({
                "session_key": "agent:main",
                "type": "decision",
                "output": "We decided on tabs",
                "summary": "We decided on tabs",
                "importance": 5
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(observation_json(17, "decision", "We decided on tabs")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let draft = ObservationDraft::new("agent:main", "decision", "We decided on tabs");
        let stored = WorkerClient::new(server.uri()).store(&draft).await.unwrap();
        assert_eq!(stored.id, 17);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.path(), "/api/sessions");
        assert_eq!(requests[1].url.path(), "/api/observations");
    }

    #[tokio::test]
    async fn store_failure_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/observations"))
            .respond_with(ResponseTemplate::new(422))
            .mount(&server)
            .await;
        let draft = ObservationDraft::new("s", "observation", "some text to keep");
        let err = WorkerClient::new(server.uri()).store(&draft).await.unwrap_err();
        assert!(matches!(err, ClientError::Status { operation: "Store", status: 422 }));
    }

    #[tokio::test]
    async fn get_returns_observation_or_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/observations/4"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(observation_json(4, "preference", "tabs")),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/observations/5"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = WorkerClient::new(server.uri());
        assert_eq!(client.get(4).await.unwrap().unwrap().kind, "preference");
        assert!(client.get(5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_distinguishes_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/observations/8"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/observations/9"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/observations/10"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = WorkerClient::new(server.uri());
        assert!(client.delete(8).await.is_ok());
        assert!(matches!(client.delete(9).await, Err(ClientError::NotFound(9))));
        assert!(matches!(
            client.delete(10).await,
            Err(ClientError::Status { operation: "Delete", status: 500 })
        ));
    }

    #[tokio::test]
    async fn stats_decodes_worker_counters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/stats"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"totalSessions": 4, "totalObservations": 120})),
            )
            .mount(&server)
            .await;
        let stats = WorkerClient::new(server.uri()).stats().await.unwrap();
        assert_eq!(stats, MemoryStats { session_count: 4, observation_count: 120 });
    }

    #[tokio::test]
    async fn trait_object_maps_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/observations/3"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let store: Box<dyn ObservationStore> = Box::new(WorkerClient::new(server.uri()));
        assert_eq!(store.delete(3).await, Err(MemError::NotFound(3)));
    }
}
