//! Whitespace normalization and word limiting.
//!
//! Both functions split on Unicode whitespace (`char::is_whitespace`), so tabs, newlines and
//! non-breaking spaces all count as separators.

/// Collapse every whitespace run to one space and trim both ends.
pub fn normalize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Keep at most `max_words` whitespace-delimited words.
///
/// Input at or under the limit is returned unchanged; otherwise the first `max_words` words
/// are rejoined with single spaces.
pub fn limit_words(s: &str, max_words: usize) -> String {
    let words: Vec<&str> = s.split_whitespace().collect();
    if words.len() <= max_words {
        return s.to_string();
    }
    words[..max_words].join(" ")
}
