//! Canonical comparison forms for raw field strings.
//!
//! Everything the filter engine and aggregator compare goes through
//! [`normalize`] (for exact values) or [`token_key`] (for list members).

use crate::model::FieldSpec;

const CONTENT_SUFFIX: &str = " content";

/// Separator rule for splitting delimited values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    /// Any comma, surrounding whitespace trimmed.
    #[default]
    Comma,
    /// Only commas not immediately followed by an ASCII digit, so "$10,001+"
    /// stays in one piece.
    CommaNotBeforeDigit,
}

/// Trim, collapse internal whitespace runs to one space, lowercase.
pub fn normalize(s: &str) -> String {
    collapse_whitespace(s).to_lowercase()
}

/// Trim and collapse internal whitespace runs, keeping case.
pub fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Splits a delimited value into trimmed, non-empty pieces in source order.
pub fn split_tokens(value: &str, delimiter: Delimiter) -> Vec<&str> {
    if value.trim().is_empty() {
        return Vec::new();
    }
    let pieces: Vec<&str> = match delimiter {
        Delimiter::Comma => value.split(',').collect(),
        Delimiter::CommaNotBeforeDigit => split_separator_commas(value),
    };
    pieces
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn split_separator_commas(value: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, ch) in value.char_indices() {
        if ch != ',' {
            continue;
        }
        let next = value[idx + 1..].chars().next();
        if next.is_some_and(|c| c.is_ascii_digit()) {
            continue;
        }
        pieces.push(&value[start..idx]);
        start = idx + 1;
    }
    pieces.push(&value[start..]);
    pieces
}

/// Strips a trailing " Content" (any case) so "Advertising Content" and
/// "Advertising" share a key.
pub fn normalize_content_type_token(tok: &str) -> &str {
    let trimmed = tok.trim();
    let len = trimmed.len();
    if len >= CONTENT_SUFFIX.len() {
        let cut = len - CONTENT_SUFFIX.len();
        if trimmed.is_char_boundary(cut) && trimmed[cut..].eq_ignore_ascii_case(CONTENT_SUFFIX) {
            return trimmed[..cut].trim();
        }
    }
    trimmed
}

/// Whitespace normalization only; "... Services" is a meaningful word.
pub fn normalize_service_token(tok: &str) -> String {
    collapse_whitespace(tok)
}

/// Display form of one token of `field`, before case folding.
pub fn token_display<F: FieldSpec>(field: F, tok: &str) -> String {
    if field.is_content_type() {
        collapse_whitespace(normalize_content_type_token(tok))
    } else {
        normalize_service_token(tok)
    }
}

/// Comparison key for one token of `field`.
pub fn token_key<F: FieldSpec>(field: F, tok: &str) -> String {
    token_display(field, tok).to_lowercase()
}

/// Deduplicated comparison keys for a stored token-list value, in first-seen order.
pub fn token_keys<F: FieldSpec>(field: F, value: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for tok in split_tokens(value, field.delimiter()) {
        let key = token_key(field, tok);
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
