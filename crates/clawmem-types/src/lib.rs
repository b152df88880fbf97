//! `clawmem-types` – shared data model for the clawmem workspace.
//!
//! Everything that crosses a crate boundary lives here: the conversation
//! message shapes handed to the plugin by its host, the observation records
//! exchanged with the storage worker, the error taxonomy, and the
//! [`ObservationStore`] seam the capture engine writes through.

pub mod store;

pub use store::ObservationStore;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Conversation messages
// ─────────────────────────────────────────────────────────────────────────────

/// The role of a participant in a conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
    /// Any role the host emits that clawmem does not know about.
    #[serde(other)]
    Other,
}

/// A structured content block inside a message (`{"type": "text", "text": …}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    /// Build a plain `"text"` block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
        }
    }
}

/// Message content as sent by the host: either a bare string or a list of
/// typed blocks.  Anything else is kept opaque and never inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    #[serde(deserialize_with = "lenient_blocks")]
    Blocks(Vec<ContentBlock>),
    Other(serde_json::Value),
}

/// Decode a block list one element at a time.  Elements that are not
/// objects, or whose fields have the wrong shape, are dropped so the rest
/// of the list survives.
fn lenient_blocks<'de, D>(deserializer: D) -> Result<Vec<ContentBlock>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let items = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(items
        .into_iter()
        .filter(serde_json::Value::is_object)
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect())
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Other(serde_json::Value::Null)
    }
}

/// A single message from a completed conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnMessage {
    pub role: Role,
    #[serde(default)]
    pub content: MessageContent,
}

impl TurnMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Whether this message was authored by a conversation participant
    /// (as opposed to a system prompt or tool result).
    pub fn is_conversational(&self) -> bool {
        matches!(self.role, Role::User | Role::Assistant)
    }
}

/// Decode a host-supplied message list, silently skipping entries that are
/// not message objects.
pub fn parse_messages(values: &[serde_json::Value]) -> Vec<TurnMessage> {
    values
        .iter()
        .filter(|v| v.is_object())
        .filter_map(|v| serde_json::from_value(v.clone()).ok())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Observations
// ─────────────────────────────────────────────────────────────────────────────

/// Category assigned to a captured observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    Bugfix,
    Decision,
    Architecture,
    Preference,
    CodeChange,
    Observation,
}

impl ObservationKind {
    pub const ALL: [ObservationKind; 6] = [
        ObservationKind::Bugfix,
        ObservationKind::Decision,
        ObservationKind::Architecture,
        ObservationKind::Preference,
        ObservationKind::CodeChange,
        ObservationKind::Observation,
    ];

    /// Wire label used by the storage worker.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservationKind::Bugfix => "bugfix",
            ObservationKind::Decision => "decision",
            ObservationKind::Architecture => "architecture",
            ObservationKind::Preference => "preference",
            ObservationKind::CodeChange => "code_change",
            ObservationKind::Observation => "observation",
        }
    }
}

impl fmt::Display for ObservationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObservationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObservationKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown observation type '{s}'"))
    }
}

/// Importance assigned to automatically captured observations.
pub const DEFAULT_IMPORTANCE: u8 = 5;

pub const MIN_IMPORTANCE: u8 = 1;
pub const MAX_IMPORTANCE: u8 = 10;

/// Round a caller-supplied importance to the nearest integer within
/// `MIN_IMPORTANCE..=MAX_IMPORTANCE`.  NaN maps to the default.
pub fn clamp_importance(raw: f64) -> u8 {
    if raw.is_nan() {
        return DEFAULT_IMPORTANCE;
    }
    // In range after the clamp, so the cast cannot truncate.
    raw.round().clamp(f64::from(MIN_IMPORTANCE), f64::from(MAX_IMPORTANCE)) as u8
}

/// A stored observation as returned by the storage worker.
///
/// `kind` stays a free-form string: explicit store requests may carry any
/// label, not only the ones the type detector produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: i64,
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub created_at: String,
    /// As reported by the worker; may be fractional.
    #[serde(default = "default_importance")]
    pub importance: f64,
}

fn default_importance() -> f64 {
    f64::from(DEFAULT_IMPORTANCE)
}

impl Observation {
    /// One-line preview: the summary when present and non-empty, otherwise
    /// the first `max_output_chars` characters of the output.
    pub fn preview(&self, max_output_chars: usize) -> Option<String> {
        match self.summary.as_deref().filter(|s| !s.is_empty()) {
            Some(summary) => Some(summary.to_string()),
            None => Some(self.output.as_deref()?.chars().take(max_output_chars).collect()),
        }
    }
}

/// An observation about to be written to the storage worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationDraft {
    pub session_key: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub importance: u8,
}

impl ObservationDraft {
    /// A draft whose summary and output are both `text`.
    pub fn new(session_key: impl Into<String>, kind: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            session_key: session_key.into(),
            kind: kind.into(),
            tool_name: None,
            input: None,
            output: Some(text.clone()),
            summary: Some(text),
            importance: DEFAULT_IMPORTANCE,
        }
    }

    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = importance;
        self
    }
}

/// Aggregate counters reported by the storage worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    #[serde(rename = "totalSessions")]
    pub session_count: u64,
    #[serde(rename = "totalObservations")]
    pub observation_count: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Failure modes of a storage collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemError {
    /// The worker is unreachable or reports itself unhealthy.
    #[error("memory worker unavailable: {0}")]
    Unavailable(String),

    /// The worker answered with a non-success status.
    #[error("{operation} failed: {status}")]
    RequestFailed { operation: &'static str, status: u16 },

    #[error("memory #{0} not found")]
    NotFound(i64),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response format: {0}")]
    BadResponse(String),

    #[error("{0} timed out")]
    Timeout(&'static str),
}
