//! [`MemoryPlugin`] – the object a host registers.
//!
//! Owns one storage client, one dedup cache and the two lifecycle hooks, and
//! exposes the direct tools.  The dedup cache lives as long as the plugin, so
//! capture history persists across turns but not across restarts.

use std::sync::Arc;

use clawmem_capture::{CapturePipeline, SharedDedupCache};
use clawmem_client::WorkerClient;
use clawmem_types::ObservationStore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::capture::{CaptureHook, TurnEnd};
use crate::config::PluginConfig;
use crate::recall::RecallHook;
use crate::tools::{MemoryTools, ToolDefinition, definitions};

pub struct MemoryPlugin {
    config: PluginConfig,
    store: Arc<dyn ObservationStore>,
    cache: SharedDedupCache,
    recall: RecallHook,
    capture: CaptureHook,
    tools: MemoryTools,
}

impl MemoryPlugin {
    /// Plugin backed by the HTTP worker at `config.worker_url`.
    pub fn new(config: PluginConfig) -> Self {
        let store: Arc<dyn ObservationStore> = Arc::new(WorkerClient::new(config.worker_url.as_str()));
        Self::with_store(config, store)
    }

    pub fn with_store(config: PluginConfig, store: Arc<dyn ObservationStore>) -> Self {
        let cache = SharedDedupCache::new(config.dedup_capacity);
        let pipeline = CapturePipeline::new(store.clone(), cache.clone());
        Self {
            recall: RecallHook::new(store.clone(), &config),
            capture: CaptureHook::new(store.clone(), pipeline, config.hook_timeout()),
            tools: MemoryTools::new(store.clone()),
            config,
            store,
            cache,
        }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn cache(&self) -> &SharedDedupCache {
        &self.cache
    }

    pub fn tools(&self) -> &MemoryTools {
        &self.tools
    }

    /// Tool registrations for the host.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        definitions()
    }

    /// Context to prepend before the agent starts, if any.
    pub async fn on_before_turn(&self, prompt: Option<&str>, cancel: &CancellationToken) -> Option<String> {
        if !self.config.auto_recall {
            return None;
        }
        self.recall.before_turn(prompt, cancel).await
    }

    /// Auto-capture after the agent finishes.  Returns how many observations
    /// were stored.
    pub async fn on_turn_end(&self, turn: &TurnEnd, cancel: &CancellationToken) -> usize {
        if !self.config.auto_capture {
            return 0;
        }
        self.capture.after_turn(turn, cancel).await
    }

    /// Startup probe.  An unreachable worker is not fatal.
    pub async fn start(&self) -> bool {
        let healthy = self.store.health().await;
        if healthy {
            info!(worker = %self.config.worker_url, "connected to worker");
        } else {
            warn!(worker = %self.config.worker_url, "worker not available");
        }
        healthy
    }

    pub fn stop(&self) {
        info!(cached = self.cache.len(), "memory plugin stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawmem_types::TurnMessage;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn worker() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/observations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "type": "preference"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [
                {"id": 1, "type": "preference", "summary": "tabs over spaces"}
            ]})))
            .mount(&server)
            .await;
        server
    }

    fn plugin(uri: &str, tweak: impl FnOnce(&mut PluginConfig)) -> MemoryPlugin {
        let mut config = PluginConfig {
            worker_url: uri.to_string(),
            ..Default::default()
        };
        tweak(&mut config);
        MemoryPlugin::new(config)
    }

    fn turn() -> TurnEnd {
        TurnEnd::new(true, vec![TurnMessage::user("Remember that I prefer tabs over spaces")])
    }

    #[tokio::test]
    async fn start_reports_worker_health() {
        let server = worker().await;
        assert!(plugin(&server.uri(), |_| {}).start().await);
        assert!(!plugin("http://127.0.0.1:9", |_| {}).start().await);
    }

    #[tokio::test]
    async fn capture_then_recall_round_trip() {
        let server = worker().await;
        let plugin = plugin(&server.uri(), |_| {});
        let cancel = CancellationToken::new();

        assert_eq!(plugin.on_turn_end(&turn(), &cancel).await, 1);
        assert_eq!(plugin.cache().len(), 1);
        // same text again is a duplicate
        assert_eq!(plugin.on_turn_end(&turn(), &cancel).await, 0);

        let ctx = plugin
            .on_before_turn(Some("which indentation do I like?"), &cancel)
            .await
            .unwrap();
        assert!(ctx.contains("- [preference] tabs over spaces"));
        plugin.stop();
    }

    #[tokio::test]
    async fn disabled_hooks_do_nothing() {
        let server = MockServer::start().await;
        let plugin = plugin(&server.uri(), |c| {
            c.auto_capture = false;
            c.auto_recall = false;
        });
        let cancel = CancellationToken::new();
        assert_eq!(plugin.on_turn_end(&turn(), &cancel).await, 0);
        assert!(plugin.on_before_turn(Some("which indentation do I like?"), &cancel).await.is_none());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn dedup_capacity_comes_from_config() {
        let plugin = plugin("http://127.0.0.1:9", |c| c.dedup_capacity = 7);
        assert_eq!(plugin.cache().lock().capacity(), 7);
        assert_eq!(plugin.tool_definitions().len(), 4);
    }
}
