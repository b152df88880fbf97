//! `clawmem-capture` – The capture-decision engine.
//!
//! Rule-based, deterministic and free of network calls: given raw turn text
//! it decides whether the text is worth remembering, what kind of memory it
//! is, whether it was captured recently, and how a prompt should be cleaned
//! before it is used as a search query.
//!
//! # Modules
//!
//! - [`normalizer`] – message-id stripping and [`Fingerprint`] derivation.
//! - [`matcher`] – [`RuleTable`][matcher::RuleTable]: ordered regex tables
//!   shared by every classifier.
//! - [`trigger`] – [`TriggerClassifier`]: the capture gate.
//! - [`type_detector`] – [`TypeDetector`]: first-match-wins categorisation.
//! - [`dedup`] – [`RecencyDedupCache`]: bounded FIFO fingerprint set and its
//!   thread-safe [`SharedDedupCache`] handle.
//! - [`pipeline`] – [`CapturePipeline`]: extract → classify → cap → store.
//! - [`query`] – [`build_query`]: full-text-search-safe recall queries.

pub mod dedup;
pub mod matcher;
pub mod normalizer;
pub mod pipeline;
pub mod query;
pub mod trigger;
pub mod type_detector;

pub use dedup::{DEFAULT_DEDUP_CAPACITY, RecencyDedupCache, SharedDedupCache};
pub use normalizer::{Fingerprint, normalize};
pub use pipeline::{CaptureOutcome, CapturePipeline, MAX_CAPTURES_PER_TURN, extract_texts};
pub use query::build_query;
pub use trigger::{CaptureDecision, DecisionReason, TriggerClassifier, should_capture};
pub use type_detector::{TypeDetector, detect_type};
