//! Direct memory actions exposed to the agent as tools.
//!
//! Each action takes JSON parameters (described by a JSON Schema derived with
//! `schemars`) and always answers with a [`ToolOutput`]; failures are turned
//! into human-readable text plus an `error` detail instead of propagating.

use std::sync::Arc;

use clawmem_capture::TypeDetector;
use clawmem_types::{MemError, Observation, ObservationDraft, ObservationStore};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::capture::DEFAULT_SESSION_KEY;

pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Characters of an observation's output shown in a search listing when it
/// has no summary.
const LISTING_PREVIEW_CHARS: usize = 100;
/// Characters of the stored text echoed back by `memory_store`.
const STORE_ECHO_CHARS: usize = 80;

// ─────────────────────────────────────────────────────────────────────────────
// Parameters
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Search query
    pub query: String,
    /// Max results (default: 10)
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct StoreParams {
    /// Information to remember
    pub text: String,
    /// Type: bugfix, decision, architecture, preference, code_change, observation
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Importance 1-10 (default: 5); rounded and clamped into range
    #[serde(default)]
    pub importance: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetParams {
    /// Memory ID
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeleteParams {
    /// Memory ID to delete
    pub id: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Definitions
// ─────────────────────────────────────────────────────────────────────────────

/// Registration metadata for one tool.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

fn schema_of<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or(Value::Null)
}

/// All tools, in registration order.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "memory_search",
            label: "Memory Search",
            description: "Search through persistent memories. Use when you need context about past work, decisions, or observations.",
            parameters: schema_of::<SearchParams>(),
        },
        ToolDefinition {
            name: "memory_store",
            label: "Memory Store",
            description: "Save important information in persistent memory.",
            parameters: schema_of::<StoreParams>(),
        },
        ToolDefinition {
            name: "memory_get",
            label: "Memory Get",
            description: "Get a specific memory by ID.",
            parameters: schema_of::<GetParams>(),
        },
        ToolDefinition {
            name: "memory_delete",
            label: "Memory Delete",
            description: "Delete a specific memory by ID. Use with caution.",
            parameters: schema_of::<DeleteParams>(),
        },
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

/// What a tool hands back to the agent.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub details: Value,
}

impl ToolOutput {
    fn new(text: impl Into<String>, details: Value) -> Self {
        Self {
            text: text.into(),
            details,
        }
    }

    fn failure(prefix: &str, err: impl std::fmt::Display) -> Self {
        let err = err.to_string();
        Self::new(format!("{prefix}: {err}"), json!({ "error": err }))
    }

    fn not_found(id: i64) -> Self {
        Self::new(format!("Memory #{id} not found."), json!({ "error": "not_found" }))
    }

    pub fn is_error(&self) -> bool {
        self.details.get("error").is_some()
    }
}

fn listing_line(index: usize, observation: &Observation) -> String {
    let text = observation.preview(LISTING_PREVIEW_CHARS).unwrap_or_default();
    format!("{}. [{}] {}...", index + 1, observation.kind, text)
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryTools
// ─────────────────────────────────────────────────────────────────────────────

/// Executes the direct memory actions against a store.
#[derive(Clone)]
pub struct MemoryTools {
    store: Arc<dyn ObservationStore>,
    detector: TypeDetector,
}

impl MemoryTools {
    pub fn new(store: Arc<dyn ObservationStore>) -> Self {
        Self {
            store,
            detector: TypeDetector::default(),
        }
    }

    pub fn with_detector(mut self, detector: TypeDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Dispatch a tool call by name.
    pub async fn execute(&self, name: &str, params: Value, session_key: Option<&str>) -> ToolOutput {
        debug!(tool = name, "tool call");
        match name {
            "memory_search" => match parse::<SearchParams>(params) {
                Ok(p) => self.search(p).await,
                Err(out) => out,
            },
            "memory_store" => match parse::<StoreParams>(params) {
                Ok(p) => self.store(p, session_key).await,
                Err(out) => out,
            },
            "memory_get" => match parse::<GetParams>(params) {
                Ok(p) => self.get(p).await,
                Err(out) => out,
            },
            "memory_delete" => match parse::<DeleteParams>(params) {
                Ok(p) => self.delete(p).await,
                Err(out) => out,
            },
            other => ToolOutput::failure("Unknown tool", other),
        }
    }

    pub async fn search(&self, params: SearchParams) -> ToolOutput {
        let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let results = match self.store.search(&params.query, limit).await {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "memory_search failed");
                return ToolOutput::failure("Memory search failed", e);
            }
        };
        if results.is_empty() {
            return ToolOutput::new("No relevant memories found.", json!({ "count": 0 }));
        }

        let listing: Vec<String> = results.iter().enumerate().map(|(i, o)| listing_line(i, o)).collect();
        let observations: Vec<Value> = results
            .iter()
            .map(|o| json!({ "id": o.id, "type": o.kind, "summary": o.summary }))
            .collect();
        ToolOutput::new(
            format!("Found {} memories:\n\n{}", results.len(), listing.join("\n")),
            json!({ "count": results.len(), "observations": observations }),
        )
    }

    pub async fn store(&self, params: StoreParams, session_key: Option<&str>) -> ToolOutput {
        let kind = params
            .kind
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| self.detector.detect(&params.text).to_string());
        let importance = params
            .importance
            .map_or(clawmem_types::DEFAULT_IMPORTANCE, clawmem_types::clamp_importance);
        let session_key = session_key.filter(|k| !k.is_empty()).unwrap_or(DEFAULT_SESSION_KEY);
        let draft = ObservationDraft::new(session_key, kind, params.text.as_str()).with_importance(importance);

        match self.store.store(draft).await {
            Ok(observation) => {
                let echo: String = params.text.chars().take(STORE_ECHO_CHARS).collect();
                ToolOutput::new(
                    format!("Stored memory #{}: \"{echo}...\"", observation.id),
                    json!({ "action": "created", "id": observation.id }),
                )
            }
            Err(e) => {
                warn!(error = %e, "memory_store failed");
                ToolOutput::failure("Failed to store memory", e)
            }
        }
    }

    pub async fn get(&self, params: GetParams) -> ToolOutput {
        match self.store.get(params.id).await {
            Ok(Some(observation)) => {
                let body = observation
                    .output
                    .as_deref()
                    .filter(|o| !o.is_empty())
                    .or(observation.summary.as_deref())
                    .unwrap_or_default()
                    .to_string();
                ToolOutput::new(
                    format!("Memory #{} [{}]:\n{body}", params.id, observation.kind),
                    json!({ "observation": observation }),
                )
            }
            Ok(None) | Err(MemError::NotFound(_)) => ToolOutput::not_found(params.id),
            Err(e) => ToolOutput::failure("Failed to get memory", e),
        }
    }

    pub async fn delete(&self, params: DeleteParams) -> ToolOutput {
        match self.store.delete(params.id).await {
            Ok(()) => ToolOutput::new(
                format!("Deleted memory #{}", params.id),
                json!({ "action": "deleted", "id": params.id }),
            ),
            Err(MemError::NotFound(_)) => ToolOutput::not_found(params.id),
            Err(e) => ToolOutput::failure("Failed to delete memory", e),
        }
    }
}

fn parse<T: DeserializeOwned>(params: Value) -> Result<T, ToolOutput> {
    serde_json::from_value(params).map_err(|e| ToolOutput::failure("Invalid parameters", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawmem_client::WorkerClient;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tools(uri: &str) -> MemoryTools {
        MemoryTools::new(Arc::new(WorkerClient::new(uri)))
    }

    #[test]
    fn definitions_carry_parameter_schemas() {
        let defs = definitions();
        let names: Vec<_> = defs.iter().map(|d| d.name).collect();
        assert_eq!(names, ["memory_search", "memory_store", "memory_get", "memory_delete"]);

        let search = &defs[0].parameters;
        assert!(search["properties"]["query"].is_object());
        assert_eq!(search["required"], json!(["query"]));
        assert!(defs[1].parameters["properties"]["type"].is_object());
    }

    #[tokio::test]
    async fn search_lists_results_with_default_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .and(body_partial_json(json!({"query": "cache", "limit": 10})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [
                {"id": 4, "type": "decision", "summary": "Redis for caching"},
                {"id": 9, "type": "bugfix", "output": "Fixed the eviction bug"}
            ]})))
            .mount(&server)
            .await;

        let out = tools(&server.uri())
            .execute("memory_search", json!({"query": "cache"}), None)
            .await;
        assert_eq!(
            out.text,
            "Found 2 memories:\n\n1. [decision] Redis for caching...\n2. [bugfix] Fixed the eviction bug..."
        );
        assert_eq!(out.details["count"], 2);
        assert_eq!(out.details["observations"][0], json!({"id": 4, "type": "decision", "summary": "Redis for caching"}));
        assert_eq!(out.details["observations"][1]["summary"], Value::Null);
    }

    #[tokio::test]
    async fn search_with_no_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&server)
            .await;
        let out = tools(&server.uri())
            .search(SearchParams { query: "nothing".into(), limit: Some(3) })
            .await;
        assert_eq!(out.text, "No relevant memories found.");
        assert_eq!(out.details, json!({"count": 0}));
    }

    #[tokio::test]
    async fn search_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let out = tools(&server.uri())
            .search(SearchParams { query: "x".into(), limit: None })
            .await;
        assert!(out.text.starts_with("Memory search failed: "));
        assert!(out.is_error());
    }

    #[tokio::test]
    async fn store_detects_type_and_uses_default_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .and(body_partial_json(json!({"session_key": "default"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/observations"))
            .and(body_partial_json(json!({
                "session_key": "default",
                "type": "bugfix",
                "importance": 5
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 21, "type": "bugfix"})))
            .expect(1)
            .mount(&server)
            .await;

        let out = tools(&server.uri())
            .execute("memory_store", json!({"text": "Fixed a crash in the parser"}), None)
            .await;
        assert_eq!(out.text, "Stored memory #21: \"Fixed a crash in the parser...\"");
        assert_eq!(out.details, json!({"action": "created", "id": 21}));
    }

    #[tokio::test]
    async fn store_honours_explicit_type_and_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/observations"))
            .and(body_partial_json(json!({"session_key": "s-7", "type": "architecture", "importance": 9})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 2, "type": "architecture"})))
            .expect(1)
            .mount(&server)
            .await;

        let out = tools(&server.uri())
            .execute(
                "memory_store",
                json!({"text": "Hexagonal layout", "type": "architecture", "importance": 9}),
                Some("s-7"),
            )
            .await;
        assert!(!out.is_error());
    }

    #[tokio::test]
    async fn store_rounds_and_clamps_importance() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/observations"))
            .and(body_partial_json(json!({"summary": "too loud", "importance": 10})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3, "type": "observation"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/observations"))
            .and(body_partial_json(json!({"summary": "halfway", "importance": 8})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 4, "type": "observation"})))
            .expect(1)
            .mount(&server)
            .await;

        let tools = tools(&server.uri());
        let loud = tools
            .execute("memory_store", json!({"text": "too loud", "importance": 300}), None)
            .await;
        assert!(!loud.is_error(), "{}", loud.text);
        let half = tools
            .execute("memory_store", json!({"text": "halfway", "importance": 7.5}), None)
            .await;
        assert!(!half.is_error(), "{}", half.text);
    }

    #[tokio::test]
    async fn get_renders_observation_or_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/observations/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 5, "type": "preference", "output": "I prefer tabs", "summary": "tabs"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/observations/6"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tools = tools(&server.uri());
        let found = tools.execute("memory_get", json!({"id": 5}), None).await;
        assert_eq!(found.text, "Memory #5 [preference]:\nI prefer tabs");
        assert_eq!(found.details["observation"]["id"], 5);

        let missing = tools.execute("memory_get", json!({"id": 6}), None).await;
        assert_eq!(missing.text, "Memory #6 not found.");
        assert_eq!(missing.details, json!({"error": "not_found"}));
    }

    #[tokio::test]
    async fn delete_reports_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/observations/8"))
            .respond_with(ResponseTemplate::new(200))
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

        let tools = tools(&server.uri());
        let deleted = tools.execute("memory_delete", json!({"id": 8}), None).await;
        assert_eq!(deleted.text, "Deleted memory #8");
        assert_eq!(deleted.details, json!({"action": "deleted", "id": 8}));

        let missing = tools.execute("memory_delete", json!({"id": 9}), None).await;
        assert_eq!(missing.text, "Memory #9 not found.");

        let failed = tools.execute("memory_delete", json!({"id": 10}), None).await;
        assert!(failed.text.starts_with("Failed to delete memory: "));
        assert!(failed.is_error());
    }

    #[tokio::test]
    async fn bad_params_and_unknown_tools_are_reported() {
        let tools = tools("http://127.0.0.1:9");
        let bad = tools.execute("memory_get", json!({"id": "seven"}), None).await;
        assert!(bad.text.starts_with("Invalid parameters: "));
        let unknown = tools.execute("memory_frobnicate", json!({}), None).await;
        assert_eq!(unknown.text, "Unknown tool: memory_frobnicate");
    }
}
