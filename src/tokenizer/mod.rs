//! Text tokenization
//!
//! Normalizes raw text into index terms: lowercase, split on
//! non-alphanumeric boundaries. The same function is applied to corpus
//! documents and to queries; asymmetric tokenization would silently break
//! ranking.

use once_cell::sync::Lazy;
use regex::Regex;

/// Compiled pattern for term extraction (runs of lowercase alphanumerics)
static TERM_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9]+").expect("Invalid regex"));

/// Tokenize a text string into index terms
///
/// Deterministic and pure: the same input always yields the same token
/// sequence. Empty or whitespace-only input yields an empty vector.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TERM_REGEX
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Tokenize multiple texts in batch, preserving input order
pub fn tokenize_batch(texts: &[String]) -> Vec<Vec<String>> {
    texts.iter().map(|t| tokenize(t)).collect()
}
