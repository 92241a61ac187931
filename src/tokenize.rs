//! Shared tokenizer for indexing, querying and summarization.
//!
//! Text is lowercased and split on every character that is not
//! alphanumeric. Empty pieces are dropped. Indexing and querying must go
//! through the same function so that terms are comparable.

/// Split `text` into lowercase alphanumeric terms.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|piece| !piece.is_empty())
        .map(|piece| piece.to_lowercase())
        .collect()
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
