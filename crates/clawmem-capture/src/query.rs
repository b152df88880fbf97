//! Recall query sanitisation.
//!
//! Turns an upcoming prompt into a string that is safe to hand to the
//! worker's full-text search: message-id tags are dropped and every
//! character with meaning in the FTS query language is replaced by a space.

use regex::Regex;
use std::sync::LazyLock;

/// Prompts shorter than this carry too little signal to search on.
pub const MIN_PROMPT_CHARS: usize = 10;

/// Characters with syntactic meaning in the search query language.
pub const FTS_SPECIAL_CHARS: &[char] = &[':', '[', ']', '(', ')', '{', '}', '*', '"'];

static MESSAGE_ID_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[message_id:[^\]]+\]").unwrap());

/// Build a search query from `prompt`, or `None` when no search should be
/// issued (prompt absent, shorter than [`MIN_PROMPT_CHARS`], or nothing left
/// after sanitising).
pub fn build_query(prompt: Option<&str>) -> Option<String> {
    let prompt = prompt?;
    if prompt.chars().count() < MIN_PROMPT_CHARS {
        return None;
    }

    let without_ids = MESSAGE_ID_BLOCK.replace_all(prompt, "");
    let sanitized: String = without_ids
        .chars()
        .map(|c| if FTS_SPECIAL_CHARS.contains(&c) { ' ' } else { c })
        .collect();
    let query = sanitized.trim();

    if query.is_empty() {
        None
    } else {
        Some(query.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_or_missing_prompt_yields_no_query() {
        assert_eq!(build_query(None), None);
        assert_eq!(build_query(Some("")), None);
        assert_eq!(build_query(Some("hi there")), None);
        assert_eq!(build_query(Some("123456789")), None);
    }

    #[test]
    fn strips_message_id_tag_and_colons() {
        let query =
            build_query(Some("What did we decide about [message_id: ab12-cd34] the caching layer?"))
                .unwrap();
        assert_eq!(query, "What did we decide about  the caching layer?");
        assert!(!query.contains(':'));
        assert!(!query.contains('['));
        assert!(!query.contains("message_id"));
    }

    #[test]
    fn replaces_each_special_character_with_a_space() {
        let query = build_query(Some("fn(x) {a*b} \"quoted\" key:value [list]")).unwrap();
        assert_eq!(query, "fn x   a b   quoted  key value  list");
        for c in FTS_SPECIAL_CHARS {
            assert!(!query.contains(*c));
        }
    }

    #[test]
    fn message_id_tag_with_any_body_is_removed() {
        let query = build_query(Some("[message_id: msg-XYZ_42] deploy status?")).unwrap();
        assert_eq!(query, "deploy status?");
    }

    #[test]
    fn prompt_of_only_special_characters_yields_none() {
        assert_eq!(build_query(Some("::::[[]]****")), None);
    }

    #[test]
    fn length_guard_applies_to_the_original_prompt() {
        // long enough before sanitising, even though the tag is removed
        let query = build_query(Some("[message_id: 1] cache")).unwrap();
        assert_eq!(query, "cache");
    }
}
