//! Text normalisation for duplicate detection.
//!
//! Two steps are shared by every stage of the capture engine:
//!
//! 1. [`clean`] strips `[message_id: …]` tags the host splices into message
//!    text and trims the result.
//! 2. [`fingerprint`] reduces cleaned text to the key used by the
//!    [`RecencyDedupCache`][crate::dedup::RecencyDedupCache].
//!
//! Only the first [`FINGERPRINT_PREFIX_CHARS`] characters contribute to the
//! fingerprint, so two captures sharing an opening but differing further on
//! collide.  The constant is tunable.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Number of leading characters of cleaned text that make up a fingerprint.
pub const FINGERPRINT_PREFIX_CHARS: usize = 100;

static MESSAGE_ID_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[message_id:\s*[0-9a-f-]+\]").unwrap());

/// Normalised dedup key derived from a piece of captured text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remove message-id tags and surrounding whitespace.
pub fn clean(text: &str) -> String {
    MESSAGE_ID_TAG.replace_all(text, "").trim().to_string()
}

/// Fingerprint text that has already been through [`clean`].
///
/// Takes the first [`FINGERPRINT_PREFIX_CHARS`] characters, lowercases them
/// and collapses every whitespace run into a single space.
pub fn fingerprint(cleaned: &str) -> Fingerprint {
    let prefix: String = cleaned.chars().take(FINGERPRINT_PREFIX_CHARS).collect();
    let lowered = prefix.to_lowercase();
    Fingerprint(lowered.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// [`clean`] followed by [`fingerprint`].
pub fn normalize(text: &str) -> Fingerprint {
    fingerprint(&clean(text))
}
