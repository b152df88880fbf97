//! [`RecallHook`] – injects relevant memories before a turn starts.
//!
//! Flow for each upcoming prompt:
//!
//! 1. Build a sanitised query; prompts that are missing or too short are
//!    skipped without any network traffic.
//! 2. Probe the worker; an unhealthy worker skips recall with a warning.
//! 3. Search and render the hits into a `<relevant-memories>` block that fits
//!    the configured token budget.
//!
//! The whole flow is bounded by the hook timeout and by the turn's
//! cancellation token.  Every failure degrades to "no context".

use std::sync::Arc;
use std::time::Duration;

use clawmem_capture::build_query;
use clawmem_types::{MemError, Observation, ObservationStore};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::PluginConfig;

/// Rough characters-per-token ratio used to honour the context budget.
const CHARS_PER_TOKEN: usize = 4;

/// Output characters shown when an observation has no summary.
const OUTPUT_PREVIEW_CHARS: usize = 200;

const CONTEXT_OPEN: &str = "<relevant-memories>\nThe following memories may be relevant:\n";
const CONTEXT_CLOSE: &str = "\n</relevant-memories>";

// ─────────────────────────────────────────────────────────────────────────────
// Context rendering
// ─────────────────────────────────────────────────────────────────────────────

fn estimate_tokens(chars: usize) -> usize {
    chars.div_ceil(CHARS_PER_TOKEN)
}

fn context_line(observation: &Observation) -> Option<String> {
    let text = observation.preview(OUTPUT_PREVIEW_CHARS)?;
    Some(format!("- [{}] {}", observation.kind, text))
}

/// Render search hits into the context block prepended to the prompt.
///
/// Hits whose type is not in `kinds` are skipped (an empty `kinds` allows
/// everything).  Lines are added in relevance order until the next one would
/// exceed `max_tokens`.  Returns `None` when nothing made it in.
pub fn format_context(results: &[Observation], max_tokens: usize, kinds: &[String]) -> Option<String> {
    let mut used = CONTEXT_OPEN.chars().count() + CONTEXT_CLOSE.chars().count();
    let mut lines = Vec::new();

    for observation in results {
        if !kinds.is_empty() && !kinds.iter().any(|k| *k == observation.kind) {
            continue;
        }
        let Some(line) = context_line(observation) else {
            continue;
        };
        // +1 for the joining newline
        let cost = line.chars().count() + usize::from(!lines.is_empty());
        if estimate_tokens(used + cost) > max_tokens {
            break;
        }
        used += cost;
        lines.push(line);
    }

    if lines.is_empty() {
        return None;
    }
    Some(format!("{CONTEXT_OPEN}{}{CONTEXT_CLOSE}", lines.join("\n")))
}

// ─────────────────────────────────────────────────────────────────────────────
// RecallHook
// ─────────────────────────────────────────────────────────────────────────────

/// Pre-turn recall.
pub struct RecallHook {
    store: Arc<dyn ObservationStore>,
    limit: usize,
    max_context_tokens: usize,
    kinds: Vec<String>,
    timeout: Duration,
}

impl RecallHook {
    pub fn new(store: Arc<dyn ObservationStore>, config: &PluginConfig) -> Self {
        Self {
            store,
            limit: config.recall_limit,
            max_context_tokens: config.max_context_tokens,
            kinds: config.capture_types.clone(),
            timeout: config.hook_timeout(),
        }
    }

    /// Produce the context block for `prompt`, or `None`.  Never fails.
    pub async fn before_turn(&self, prompt: Option<&str>, cancel: &CancellationToken) -> Option<String> {
        info!(
            prompt_len = prompt.map_or(0, |p| p.chars().count()),
            "recall: before_turn fired"
        );
        let Some(query) = build_query(prompt) else {
            info!("recall: prompt too short, skipping");
            return None;
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                warn!("recall: cancelled with its turn");
                None
            }
            res = tokio::time::timeout(self.timeout, self.recall(&query)) => match res {
                Ok(Ok(context)) => context,
                Ok(Err(e)) => {
                    warn!(error = %e, "recall failed");
                    None
                }
                Err(_) => {
                    warn!(timeout_ms = self.timeout.as_millis() as u64, "recall timed out");
                    None
                }
            },
        }
    }

    async fn recall(&self, query: &str) -> Result<Option<String>, MemError> {
        let healthy = self.store.health().await;
        info!(healthy, "recall: worker health");
        if !healthy {
            return Err(MemError::Unavailable("worker not available for recall".into()));
        }

        let preview: String = query.chars().take(50).collect();
        info!(query = %preview, "recall: sanitized query");

        let results = self.store.search(query, self.limit).await?;
        info!(count = results.len(), "recall: search returned");
        if results.is_empty() {
            return Ok(None);
        }

        let context = format_context(&results, self.max_context_tokens, &self.kinds);
        if context.is_some() {
            info!(count = results.len(), "recall: injecting memories into context");
        }
        Ok(context)
    }
}
