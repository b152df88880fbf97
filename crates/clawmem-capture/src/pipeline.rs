//! [`CapturePipeline`] – turns the messages of a finished turn into stored
//! observations.
//!
//! Each call to [`CapturePipeline::process_turn`]:
//!
//! 1. **Extract** – collects string content and `"text"` blocks from user and
//!    assistant messages; every other role and block type is ignored.
//! 2. **Classify** – filters candidates through the
//!    [`TriggerClassifier`], which also consults the dedup cache.
//! 3. **Cap** – keeps at most [`MAX_CAPTURES_PER_TURN`] texts, in original
//!    order.
//! 4. **Store** – builds an [`ObservationDraft`] per text (summary cut to
//!    [`SUMMARY_MAX_CHARS`], full text as output, category from the
//!    [`TypeDetector`]), submits it, and records its fingerprint once the
//!    store call succeeds.
//!
//! The first failing store call ends the batch.  Nothing is retried: capture
//! is best effort per turn.

use std::sync::Arc;

use clawmem_types::{
    ContentBlock, DEFAULT_IMPORTANCE, MemError, MessageContent, Observation, ObservationDraft,
    ObservationStore, TurnMessage,
};
use tracing::debug;

use crate::dedup::SharedDedupCache;
use crate::normalizer;
use crate::trigger::TriggerClassifier;
use crate::type_detector::TypeDetector;

/// Upper bound on observations stored for a single turn.
pub const MAX_CAPTURES_PER_TURN: usize = 3;

/// Stored summaries are cut to this many characters.
pub const SUMMARY_MAX_CHARS: usize = 500;

// ─────────────────────────────────────────────────────────────────────────────
// Extraction
// ─────────────────────────────────────────────────────────────────────────────

/// Candidate texts from the conversational messages of a turn, in order.
pub fn extract_texts(messages: &[TurnMessage]) -> Vec<&str> {
    let mut texts = Vec::new();
    for msg in messages.iter().filter(|m| m.is_conversational()) {
        match &msg.content {
            MessageContent::Text(text) => texts.push(text.as_str()),
            MessageContent::Blocks(blocks) => {
                texts.extend(blocks.iter().filter_map(text_of_block));
            }
            MessageContent::Other(_) => {}
        }
    }
    texts
}

fn text_of_block(block: &ContentBlock) -> Option<&str> {
    if block.kind == "text" {
        block.text.as_deref()
    } else {
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outcome
// ─────────────────────────────────────────────────────────────────────────────

/// Result of one [`CapturePipeline::process_turn`] call.
#[derive(Debug, Default)]
pub struct CaptureOutcome {
    /// Texts that passed the classifier, before the per-turn cap.
    pub accepted: usize,
    /// Observations the worker acknowledged.
    pub stored: Vec<Observation>,
    /// The failure that ended the batch early, if any.
    pub error: Option<MemError>,
}

impl CaptureOutcome {
    pub fn stored_count(&self) -> usize {
        self.stored.len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CapturePipeline
// ─────────────────────────────────────────────────────────────────────────────

/// Orchestrates classification, deduplication and storage for a turn.
///
/// The dedup cache is injected so several pipelines (or tests) can share
/// or isolate capture history as they see fit.
pub struct CapturePipeline {
    store: Arc<dyn ObservationStore>,
    cache: SharedDedupCache,
    classifier: TriggerClassifier,
    detector: TypeDetector,
    max_per_turn: usize,
}

impl CapturePipeline {
    pub fn new(store: Arc<dyn ObservationStore>, cache: SharedDedupCache) -> Self {
        Self {
            store,
            cache,
            classifier: TriggerClassifier::default(),
            detector: TypeDetector::default(),
            max_per_turn: MAX_CAPTURES_PER_TURN,
        }
    }

    pub fn with_classifier(mut self, classifier: TriggerClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_detector(mut self, detector: TypeDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_max_per_turn(mut self, max: usize) -> Self {
        self.max_per_turn = max;
        self
    }

    pub fn cache(&self) -> &SharedDedupCache {
        &self.cache
    }

    pub fn detector(&self) -> &TypeDetector {
        &self.detector
    }

    /// Steps 1–2: every candidate text the classifier accepts, in order.
    pub fn accepted_texts<'a>(&self, messages: &'a [TurnMessage]) -> Vec<&'a str> {
        let cache = self.cache.lock();
        extract_texts(messages)
            .into_iter()
            .filter(|text| {
                let decision = self.classifier.classify(text, &cache);
                if !decision.accepted {
                    debug!(reason = %decision.reason, "capture candidate rejected");
                }
                decision.accepted
            })
            .collect()
    }

    /// Build the draft stored for an accepted `text`.
    pub fn draft(&self, session_key: &str, text: &str) -> ObservationDraft {
        let cleaned = normalizer::clean(text);
        let summary: String = cleaned.chars().take(SUMMARY_MAX_CHARS).collect();
        ObservationDraft {
            session_key: session_key.to_string(),
            kind: self.detector.detect(&cleaned).as_str().to_string(),
            tool_name: None,
            input: None,
            output: Some(cleaned),
            summary: Some(summary),
            importance: DEFAULT_IMPORTANCE,
        }
    }

    /// Run the full pipeline over a turn's messages.
    pub async fn process_turn(&self, session_key: &str, messages: &[TurnMessage]) -> CaptureOutcome {
        let accepted = self.accepted_texts(messages);
        let mut outcome = CaptureOutcome {
            accepted: accepted.len(),
            ..Default::default()
        };

        for text in accepted.into_iter().take(self.max_per_turn) {
            let draft = self.draft(session_key, text);
            let fingerprint = normalizer::normalize(text);
            match self.store.store(draft).await {
                Ok(observation) => {
                    self.cache.record(fingerprint);
                    debug!(id = observation.id, kind = %observation.kind, "observation captured");
                    outcome.stored.push(observation);
                }
                Err(e) => {
                    outcome.error = Some(e);
                    break;
                }
            }
        }
        outcome
    }
}
