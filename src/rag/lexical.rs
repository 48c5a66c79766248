//! Tokenization and lexical similarity shared by reranking, auto-citation,
//! and verification.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9]+").expect("valid token regex"))
}

/// Lowercase alphanumeric tokens in order of appearance.
pub fn tokenize(text: &str) -> Vec<String> {
    token_re()
        .find_iter(text)
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect()
}

/// Jaccard overlap of two token sequences, as sets. 0.0 when either side is
/// empty, so callers never divide by zero.
pub fn jaccard(a: &[String], b: &[String]) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a_set: HashSet<&str> = a.iter().map(String::as_str).collect();
    let b_set: HashSet<&str> = b.iter().map(String::as_str).collect();
    let inter = a_set.intersection(&b_set).count();
    let union = a_set.union(&b_set).count();
    if union == 0 {
        0.0
    } else {
        inter as f32 / union as f32
    }
}

/// Truncate to at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_splits_on_punctuation() {
        let tokens = tokenize("Section 67-4: Minor Subdivisions.");
        assert_eq!(tokens, vec!["section", "67", "4", "minor", "subdivisions"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  ...  ").is_empty());
    }

    #[test]
    fn test_jaccard_symmetric() {
        let a = tokenize("building permit requirements");
        let b = tokenize("permit process for building");
        assert_eq!(jaccard(&a, &b), jaccard(&b, &a));
    }

    #[test]
    fn test_jaccard_identity() {
        let a = tokenize("minor subdivision three lots");
        assert_eq!(jaccard(&a, &a), 1.0);
    }

    #[test]
    fn test_jaccard_empty_side_is_zero() {
        let a = tokenize("anything at all");
        assert_eq!(jaccard(&[], &a), 0.0);
        assert_eq!(jaccard(&a, &[]), 0.0);
        assert_eq!(jaccard(&[], &[]), 0.0);
    }

    #[test]
    fn test_jaccard_partial_overlap() {
        let a = tokenize("building permit");
        let b = tokenize("building permit process");
        // 2 shared tokens over a union of 3
        assert!((jaccard(&a, &b) - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_truncate_chars_short_string() {
        assert_eq!(truncate_chars("hello", 100), "hello");
    }

    #[test]
    fn test_truncate_chars_counts_chars_not_bytes() {
        let s = "échéancier";
        let cut = truncate_chars(s, 4);
        assert_eq!(cut, "éché");
        assert!(s.is_char_boundary(cut.len()));
    }
}
