//! [`CaptureHook`] – stores noteworthy text after a successful turn.

use std::sync::Arc;
use std::time::Duration;

use clawmem_capture::{CaptureOutcome, CapturePipeline};
use clawmem_types::{MemError, ObservationStore, TurnMessage, parse_messages};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Session used when the host does not identify one.
pub const DEFAULT_SESSION_KEY: &str = "default";

/// The end-of-turn event as delivered by the host.
#[derive(Debug, Clone, Default)]
pub struct TurnEnd {
    pub success: bool,
    pub messages: Vec<TurnMessage>,
    pub session_key: Option<String>,
}

impl TurnEnd {
    pub fn new(success: bool, messages: Vec<TurnMessage>) -> Self {
        Self {
            success,
            messages,
            session_key: None,
        }
    }

    pub fn with_session(mut self, key: impl Into<String>) -> Self {
        self.session_key = Some(key.into());
        self
    }

    /// Decode the loosely-typed host event.  Missing fields read as a failed,
    /// empty turn.
    pub fn from_value(event: &Value, session_key: Option<&str>) -> Self {
        let messages = event
            .get("messages")
            .and_then(Value::as_array)
            .map(|values| parse_messages(values))
            .unwrap_or_default();
        Self {
            success: event.get("success").and_then(Value::as_bool).unwrap_or(false),
            messages,
            session_key: session_key.map(str::to_string),
        }
    }
}

/// Post-turn auto-capture.
pub struct CaptureHook {
    store: Arc<dyn ObservationStore>,
    pipeline: CapturePipeline,
    timeout: Duration,
}

impl CaptureHook {
    pub fn new(store: Arc<dyn ObservationStore>, pipeline: CapturePipeline, timeout: Duration) -> Self {
        Self {
            store,
            pipeline,
            timeout,
        }
    }

    pub fn pipeline(&self) -> &CapturePipeline {
        &self.pipeline
    }

    /// Capture from a finished turn.  Returns the number of observations
    /// stored; failures are logged and read as zero.
    pub async fn after_turn(&self, turn: &TurnEnd, cancel: &CancellationToken) -> usize {
        if !turn.success || turn.messages.is_empty() {
            debug!(success = turn.success, "capture: nothing to capture");
            return 0;
        }
        let session_key = turn.session_key.as_deref().unwrap_or(DEFAULT_SESSION_KEY);

        tokio::select! {
            _ = cancel.cancelled() => {
                warn!("capture: cancelled with its turn");
                0
            }
            res = tokio::time::timeout(self.timeout, self.capture(session_key, &turn.messages)) => match res {
                Ok(Ok(outcome)) => outcome.stored_count(),
                Ok(Err(e)) => {
                    warn!(error = %e, "capture failed");
                    0
                }
                Err(_) => {
                    warn!(timeout_ms = self.timeout.as_millis() as u64, "capture timed out");
                    0
                }
            },
        }
    }

    async fn capture(&self, session_key: &str, messages: &[TurnMessage]) -> Result<CaptureOutcome, MemError> {
        if !self.store.health().await {
            return Err(MemError::Unavailable("worker not available for capture".into()));
        }

        let outcome = self.pipeline.process_turn(session_key, messages).await;
        let count = outcome.stored_count();
        if count > 0 {
            info!(count, session = session_key, "auto-captured memories");
        }
        match outcome.error {
            // Partial batches still count; only report a failure when nothing landed.
            Some(e) if count == 0 => Err(e),
            Some(e) => {
                warn!(error = %e, stored = count, "capture stopped early");
                Ok(CaptureOutcome { error: None, ..outcome })
            }
            None => Ok(outcome),
        }
    }
}
