//! Token counting for usage estimation.
//!
//! Counts with the `cl100k_base` encoding (`gpt-3.5-turbo-instruct`). The BPE
//! tables are loaded once; if loading fails the count falls back to a
//! four-bytes-per-token heuristic.

use once_cell::sync::Lazy;
use tiktoken_rs::{cl100k_base, CoreBPE};

static CL100K: Lazy<Option<CoreBPE>> = Lazy::new(|| match cl100k_base() {
    Ok(bpe) => Some(bpe),
    Err(e) => {
        tracing::warn!("cl100k_base unavailable, estimating tokens by length: {}", e);
        None
    }
});

/// Number of tokens in `text`.
pub fn count(text: &str) -> u64 {
    match CL100K.as_ref() {
        Some(bpe) => bpe.encode_with_special_tokens(text).len() as u64,
        None => heuristic(text),
    }
}

/// Number of tokens in the compact JSON rendering of `value`.
pub fn count_json<T: serde::Serialize>(value: &T) -> u64 {
    count(&serde_json::to_string(value).unwrap_or_default())
}

fn heuristic(text: &str) -> u64 {
    text.len().div_ceil(4) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        assert_eq!(count(""), 0);
    }

    #[test]
    fn test_counts_grow_with_text() {
        let short = count("App crashes");
        let long = count("App crashes on launch after the latest update, every single time");
        assert!(short > 0);
        assert!(long > short);
    }

    #[test]
    fn test_single_number() {
        assert_eq!(count("0"), 1);
        assert_eq!(count("-1"), count("-1"));
    }

    #[test]
    fn test_heuristic() {
        assert_eq!(heuristic(""), 0);
        assert_eq!(heuristic("abcd"), 1);
        assert_eq!(heuristic("abcde"), 2);
    }

    #[test]
    fn test_count_json() {
        let value = serde_json::json!({"title": "Dark mode"});
        assert_eq!(count_json(&value), count(r#"{"title":"Dark mode"}"#));
    }
}
