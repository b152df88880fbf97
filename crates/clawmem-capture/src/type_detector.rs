//! Category assignment for captured text.
//!
//! [`TYPE_RULES`] is evaluated top to bottom on the lowercased text and the
//! first hit wins.  Error reports outrank design talk: a text that mentions
//! both a bug and the architecture is a `bugfix`.

use clawmem_types::ObservationKind;
use regex::Error as RegexError;
use std::sync::LazyLock;

use crate::matcher::{Rule, RuleTable};

/// Priority-ordered category rules.  Anything unmatched is an
/// [`ObservationKind::Observation`].
pub const TYPE_RULES: &[(ObservationKind, &str)] = &[
    (ObservationKind::Bugfix, r"bug|fix|error|issue|crash"),
    (ObservationKind::Decision, r"decided|decision|will use|chose"),
    (ObservationKind::Architecture, r"architecture|design|pattern|structure"),
    (
        ObservationKind::Preference,
        r"\bprefer\b|\bi like\b|\bi want\b|\bi love\b|\bi hate\b",
    ),
    (ObservationKind::CodeChange, r"function|class|method|api"),
];

static DEFAULT_DETECTOR: LazyLock<TypeDetector> =
    LazyLock::new(|| TypeDetector::new(RuleTable::compile(TYPE_RULES).unwrap()));

/// First-match-wins category classifier.
#[derive(Debug, Clone)]
pub struct TypeDetector {
    rules: RuleTable<ObservationKind>,
}

impl Default for TypeDetector {
    fn default() -> Self {
        DEFAULT_DETECTOR.clone()
    }
}

impl TypeDetector {
    pub fn new(rules: RuleTable<ObservationKind>) -> Self {
        Self { rules }
    }

    /// Append a lowest-priority rule (still ahead of the fallback).
    pub fn with_rule(mut self, kind: ObservationKind, pattern: &str) -> Result<Self, RegexError> {
        self.rules.push(Rule::new(kind, pattern)?);
        Ok(self)
    }

    pub fn detect(&self, text: &str) -> ObservationKind {
        let lower = text.to_lowercase();
        self.rules
            .first_match(&lower)
            .copied()
            .unwrap_or(ObservationKind::Observation)
    }
}

/// [`TypeDetector::detect`] with the built-in rules.
pub fn detect_type(text: &str) -> ObservationKind {
    DEFAULT_DETECTOR.detect(text)
}
