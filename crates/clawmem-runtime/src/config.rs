//! Plugin configuration as handed over by the host.
//!
//! The host passes the plugin's config block as JSON with camelCase keys;
//! every field is optional and falls back to its default.

use std::time::Duration;

use clawmem_capture::DEFAULT_DEDUP_CAPACITY;
use clawmem_client::DEFAULT_WORKER_URL;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginConfig {
    /// Base URL of the storage worker.
    pub worker_url: String,
    /// Capture observations after successful turns.
    pub auto_capture: bool,
    /// Inject relevant memories before a turn starts.
    pub auto_recall: bool,
    /// Token budget for the injected context block.
    pub max_context_tokens: usize,
    /// Observation types allowed into recalled context.  Empty means all.
    pub capture_types: Vec<String>,
    pub dedup_capacity: usize,
    /// Number of search results requested for auto-recall.
    pub recall_limit: usize,
    /// Overall budget for a single hook invocation, in milliseconds.
    pub hook_timeout_ms: u64,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            worker_url: DEFAULT_WORKER_URL.to_string(),
            auto_capture: true,
            auto_recall: true,
            max_context_tokens: 4000,
            capture_types: Vec::new(),
            dedup_capacity: DEFAULT_DEDUP_CAPACITY,
            recall_limit: 5,
            hook_timeout_ms: 10_000,
        }
    }
}

impl PluginConfig {
    /// Decode the host-supplied config block.  A missing or malformed block
    /// yields the defaults.
    pub fn from_host(value: Option<&serde_json::Value>) -> Self {
        let Some(value) = value.filter(|v| !v.is_null()) else {
            return Self::default();
        };
        match serde_json::from_value(value.clone()) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(error = %e, "invalid plugin config, using defaults");
                Self::default()
            }
        }
    }

    pub fn hook_timeout(&self) -> Duration {
        Duration::from_millis(self.hook_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_block_gives_defaults() {
        let cfg = PluginConfig::from_host(None);
        assert_eq!(cfg.worker_url, "http://127.0.0.1:37778");
        assert!(cfg.auto_capture);
        assert!(cfg.auto_recall);
        assert_eq!(cfg.max_context_tokens, 4000);
        assert_eq!(cfg.dedup_capacity, 200);
        assert_eq!(PluginConfig::from_host(Some(&serde_json::Value::Null)), cfg);
    }

    #[test]
    fn camel_case_keys_are_honoured() {
        let cfg = PluginConfig::from_host(Some(&json!({
            "workerUrl": "http://worker:9000",
            "autoCapture": false,
            "captureTypes": ["bugfix"],
            "hookTimeoutMs": 250
        })));
        assert_eq!(cfg.worker_url, "http://worker:9000");
        assert!(!cfg.auto_capture);
        assert!(cfg.auto_recall);
        assert_eq!(cfg.capture_types, vec!["bugfix".to_string()]);
        assert_eq!(cfg.hook_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn malformed_block_falls_back_to_defaults() {
        let cfg = PluginConfig::from_host(Some(&json!({"autoRecall": "yes please"})));
        assert_eq!(cfg, PluginConfig::default());
    }
}
