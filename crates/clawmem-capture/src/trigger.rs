//! [`TriggerClassifier`] – decides whether a piece of turn text is worth
//! capturing.
//!
//! The gate runs in a fixed order and the first failing check rejects:
//!
//! | check | rejects when |
//! |---|---|
//! | length | fewer than 20 or more than 2000 characters |
//! | recall marker | text contains `<relevant-memories>` (injected context) |
//! | markup | text starts with `<` and contains `</` |
//! | system message | any [`SYSTEM_MESSAGE_RULES`] pattern matches |
//! | cleaned length | fewer than 20 characters once message-id tags are gone |
//! | dedup | the cleaned fingerprint is already in the dedup cache |
//! | trigger | no [`CAPTURE_TRIGGER_RULES`] pattern matches the cleaned text |
//!
//! The classifier is a pure predicate over the text and the current cache
//! state; it never mutates the cache.

use regex::Error as RegexError;
use std::fmt;
use std::sync::LazyLock;

use crate::dedup::RecencyDedupCache;
use crate::matcher::{Rule, RuleTable};
use crate::normalizer;

/// Texts shorter than this are never captured.
pub const MIN_CAPTURE_CHARS: usize = 20;
/// Texts longer than this are never captured.
pub const MAX_CAPTURE_CHARS: usize = 2000;

/// Marker wrapping context injected by the recall hook.
pub const RECALL_MARKER: &str = "<relevant-memories>";

/// Operational noise: heartbeats, system-bracketed notices, workspace
/// instructions, price alerts, lines ending in a bare message-id tag.
pub const SYSTEM_MESSAGE_RULES: &[(&str, &str)] = &[
    ("heartbeat_prompt", r"(?i)^Read HEARTBEAT\.md"),
    ("system_bracket", r"^System:\s*\["),
    ("heartbeat_context", r"(?i)heartbeat.*workspace context"),
    ("strict_instruction", r"(?i)follow it strictly.*do not infer"),
    ("trailing_message_id", r"\[message_id:\s*[0-9a-f-]+\]\s*$"),
    ("heartbeat_ok", r"(?i)^HEARTBEAT_OK$"),
    ("silver_price_check", r"(?i)silver price check"),
    ("price_alert", r"(?i)price alert"),
];

/// Semantic triggers; one hit is enough to capture.
pub const CAPTURE_TRIGGER_RULES: &[(&str, &str)] = &[
    ("remember", r"(?i)remember\b|zapamatuj"),
    (
        "preference",
        r"(?i)\bprefer\b|radši|\bi like\b|\bi love\b|\bi hate\b|\bi want\b",
    ),
    ("decision", r"(?i)decided|rozhodli|will use|budeme"),
    ("emphasis", r"(?i)important|always|never"),
    ("problem", r"(?i)bug|fix|error|issue"),
    ("design", r"(?i)architecture|design|pattern"),
    ("annotation", r"(?i)TODO|FIXME|NOTE"),
];

static SYSTEM_TABLE: LazyLock<RuleTable<&'static str>> =
    LazyLock::new(|| RuleTable::compile(SYSTEM_MESSAGE_RULES).unwrap());

static TRIGGER_TABLE: LazyLock<RuleTable<&'static str>> =
    LazyLock::new(|| RuleTable::compile(CAPTURE_TRIGGER_RULES).unwrap());

static DEFAULT_CLASSIFIER: LazyLock<TriggerClassifier> = LazyLock::new(TriggerClassifier::default);

// ─────────────────────────────────────────────────────────────────────────────
// Decision
// ─────────────────────────────────────────────────────────────────────────────

/// Why a text was accepted or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    /// Accepted; carries the label of the trigger that matched.
    Trigger(&'static str),
    TooShort,
    TooLong,
    RecalledContext,
    Markup,
    /// Rejected as operational noise; carries the matching rule label.
    SystemMessage(&'static str),
    CleanedTooShort,
    Duplicate,
    NoTrigger,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionReason::Trigger(label) => write!(f, "trigger:{label}"),
            DecisionReason::TooShort => f.write_str("too_short"),
            DecisionReason::TooLong => f.write_str("too_long"),
            DecisionReason::RecalledContext => f.write_str("recalled_context"),
            DecisionReason::Markup => f.write_str("markup"),
            DecisionReason::SystemMessage(label) => write!(f, "system:{label}"),
            DecisionReason::CleanedTooShort => f.write_str("cleaned_too_short"),
            DecisionReason::Duplicate => f.write_str("duplicate"),
            DecisionReason::NoTrigger => f.write_str("no_trigger"),
        }
    }
}

/// Outcome of [`TriggerClassifier::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureDecision {
    pub accepted: bool,
    pub reason: DecisionReason,
}

impl CaptureDecision {
    fn accept(trigger: &'static str) -> Self {
        Self {
            accepted: true,
            reason: DecisionReason::Trigger(trigger),
        }
    }

    fn reject(reason: DecisionReason) -> Self {
        Self {
            accepted: false,
            reason,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TriggerClassifier
// ─────────────────────────────────────────────────────────────────────────────

/// Rule-driven capture gate.
#[derive(Debug, Clone)]
pub struct TriggerClassifier {
    system: RuleTable<&'static str>,
    triggers: RuleTable<&'static str>,
}

impl Default for TriggerClassifier {
    fn default() -> Self {
        Self {
            system: SYSTEM_TABLE.clone(),
            triggers: TRIGGER_TABLE.clone(),
        }
    }
}

impl TriggerClassifier {
    /// Add a trigger pattern after the built-in ones.
    pub fn with_trigger(mut self, label: &'static str, pattern: &str) -> Result<Self, RegexError> {
        self.triggers.push(Rule::new(label, pattern)?);
        Ok(self)
    }

    /// Add a system-message pattern after the built-in ones.
    pub fn with_system_pattern(
        mut self,
        label: &'static str,
        pattern: &str,
    ) -> Result<Self, RegexError> {
        self.system.push(Rule::new(label, pattern)?);
        Ok(self)
    }

    /// Run every check against `text` and report the first that decides.
    pub fn classify(&self, text: &str, cache: &RecencyDedupCache) -> CaptureDecision {
        let len = text.chars().count();
        if len < MIN_CAPTURE_CHARS {
            return CaptureDecision::reject(DecisionReason::TooShort);
        }
        if len > MAX_CAPTURE_CHARS {
            return CaptureDecision::reject(DecisionReason::TooLong);
        }
        if text.contains(RECALL_MARKER) {
            return CaptureDecision::reject(DecisionReason::RecalledContext);
        }
        if text.starts_with('<') && text.contains("</") {
            return CaptureDecision::reject(DecisionReason::Markup);
        }
        if let Some(label) = self.system.first_match(text) {
            return CaptureDecision::reject(DecisionReason::SystemMessage(label));
        }

        let cleaned = normalizer::clean(text);
        if cleaned.chars().count() < MIN_CAPTURE_CHARS {
            return CaptureDecision::reject(DecisionReason::CleanedTooShort);
        }
        if cache.contains(&normalizer::fingerprint(&cleaned)) {
            return CaptureDecision::reject(DecisionReason::Duplicate);
        }

        match self.triggers.first_match(&cleaned) {
            Some(label) => CaptureDecision::accept(label),
            None => CaptureDecision::reject(DecisionReason::NoTrigger),
        }
    }

    pub fn should_capture(&self, text: &str, cache: &RecencyDedupCache) -> bool {
        self.classify(text, cache).accepted
    }
}

/// [`TriggerClassifier::should_capture`] with the built-in rule tables.
pub fn should_capture(text: &str, cache: &RecencyDedupCache) -> bool {
    DEFAULT_CLASSIFIER.should_capture(text, cache)
}
