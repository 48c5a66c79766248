//! Post-hoc lexical verification. Every sentence of the answer is scored
//! against the source chunks; supported sentences get their best citation
//! appended, unsupported ones are flagged inline. Sentences that already
//! carry a marker are trusted without rescoring.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::{SourceChunk, VerificationDetail, VerificationReport};
use crate::rag::cite::{append_marker, best_match, marker_re, tokenize_sources};
use crate::rag::lexical::tokenize;

/// Minimum Jaccard overlap for a sentence to count as supported.
pub const DEFAULT_MIN_SUPPORT: f32 = 0.08;

/// UI boilerplate that may leak into model output; passed through unscored.
const BOILERPLATE_PREFIXES: [&str; 3] = ["was this answer helpful", "yes,", "no,"];

fn boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]\s+").expect("valid boundary regex"))
}

/// Split into sentence-like units: newlines first, then sentence boundaries
/// within each line. Bullet lines stay whole. Blank lines are preserved as
/// empty units so rejoining restores paragraph breaks.
fn split_sentences(text: &str) -> Vec<String> {
    let mut units = Vec::new();
    for raw in text.split('\n') {
        let s = raw.trim();
        if s.is_empty() {
            units.push(String::new());
            continue;
        }
        if s.starts_with("- ") || s.starts_with("* ") || s.starts_with('•') {
            units.push(s.to_string());
            continue;
        }
        let mut start = 0;
        for m in boundary_re().find_iter(s) {
            // The terminator stays with its sentence; the whitespace is dropped.
            let end = m.start() + 1;
            units.push(s[start..end].to_string());
            start = m.end();
        }
        if start < s.len() {
            units.push(s[start..].to_string());
        }
    }
    units
}

/// Annotate each sentence with its best citation or an
/// `(insufficient support)` flag, and report per-sentence scores.
///
/// Counting: boilerplate and blank units pass through uncounted; pre-marked
/// sentences count as supported with no rescoring; everything else is scored,
/// so `supported + unsupported == total_sentences` always holds.
pub fn verify_answer_support(
    answer_text: &str,
    sources: &[SourceChunk],
    min_support: f32,
) -> (String, VerificationReport) {
    if answer_text.is_empty() || sources.is_empty() {
        return (answer_text.to_string(), VerificationReport::default());
    }

    let src_tokens = tokenize_sources(sources);
    let sentences = split_sentences(answer_text);

    let mut annotated: Vec<String> = Vec::with_capacity(sentences.len());
    let mut details: Vec<VerificationDetail> = Vec::new();
    let mut supported = 0usize;
    let mut unsupported = 0usize;

    for (i, sent) in sentences.iter().enumerate() {
        let stripped = sent.trim();
        if stripped.is_empty() {
            annotated.push(sent.clone());
            continue;
        }

        let lower = stripped.to_lowercase();
        if BOILERPLATE_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            annotated.push(sent.clone());
            continue;
        }

        if marker_re().is_match(stripped) {
            annotated.push(sent.clone());
            details.push(VerificationDetail {
                index: i,
                best_marker: None,
                best_score: None,
                supported: true,
            });
            supported += 1;
            continue;
        }

        let tokens = tokenize(stripped);
        let best = best_match(&tokens, &src_tokens);
        let best_score = best.map_or(0.0, |(_, s)| s);

        if let Some((idx, _)) = best.filter(|(_, s)| *s >= min_support) {
            annotated.push(append_marker(sent, idx));
            details.push(VerificationDetail {
                index: i,
                best_marker: Some(idx),
                best_score: Some(best_score),
                supported: true,
            });
            supported += 1;
        } else {
            annotated.push(flag_unsupported(sent));
            details.push(VerificationDetail {
                index: i,
                best_marker: best.map(|(idx, _)| idx),
                best_score: Some(best_score),
                supported: false,
            });
            unsupported += 1;
        }
    }

    let report = VerificationReport {
        total_sentences: supported + unsupported,
        supported,
        unsupported,
        details,
    };
    (annotated.join("\n"), report)
}

fn flag_unsupported(sent: &str) -> String {
    if sent.ends_with(' ') {
        format!("{sent}(insufficient support)")
    } else {
        format!("{sent} (insufficient support)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(index: usize, id: &str, chunk: &str) -> SourceChunk {
        SourceChunk {
            index,
            collection: "la_plata_county_code".to_string(),
            id: id.to_string(),
            preview: chunk.chars().take(200).collect(),
            chunk: chunk.to_string(),
        }
    }

    fn sources() -> Vec<SourceChunk> {
        vec![
            source(1, "67-4", "a minor subdivision divides land into three lots or fewer"),
            source(2, "70-1", "a building permit is required for any structure over 200 square feet"),
        ]
    }

    // ─── split_sentences ─────────────────────────────────

    #[test]
    fn test_split_on_sentence_boundaries() {
        let units = split_sentences("First sentence. Second one! Third?");
        assert_eq!(units, vec!["First sentence.", "Second one!", "Third?"]);
    }

    #[test]
    fn test_bullets_kept_whole() {
        let units = split_sentences("- first point. with a period\n* second point");
        assert_eq!(units, vec!["- first point. with a period", "* second point"]);
    }

    #[test]
    fn test_blank_lines_preserved() {
        let units = split_sentences("one\n\ntwo");
        assert_eq!(units, vec!["one", "", "two"]);
    }

    // ─── verify_answer_support ───────────────────────────

    #[test]
    fn test_counts_always_balance() {
        let answer = "A minor subdivision divides land into three lots or fewer. \
                      Unrelated filler about nothing in particular.";
        let (_, report) = verify_answer_support(answer, &sources(), DEFAULT_MIN_SUPPORT);
        assert_eq!(report.supported + report.unsupported, report.total_sentences);
        assert_eq!(report.total_sentences, 2);
        assert_eq!(report.supported, 1);
        assert_eq!(report.unsupported, 1);
    }

    #[test]
    fn test_supported_sentence_gets_marker() {
        let answer = "A minor subdivision divides land into three lots or fewer.";
        let (annotated, report) = verify_answer_support(answer, &sources(), DEFAULT_MIN_SUPPORT);
        assert!(annotated.ends_with("[1]"));
        assert_eq!(report.details[0].best_marker, Some(1));
        assert!(report.details[0].supported);
    }

    #[test]
    fn test_unsupported_sentence_flagged() {
        let answer = "The moon is made of green cheese.";
        let (annotated, report) = verify_answer_support(answer, &sources(), DEFAULT_MIN_SUPPORT);
        assert!(annotated.ends_with("(insufficient support)"));
        assert_eq!(report.unsupported, 1);
        assert!(!report.details[0].supported);
    }

    #[test]
    fn test_pre_marked_sentence_trusted() {
        let answer = "Minor subdivisions are limited to three lots [1].";
        let (annotated, report) = verify_answer_support(answer, &sources(), DEFAULT_MIN_SUPPORT);
        assert_eq!(annotated, answer);
        assert_eq!(report.supported, 1);
        assert_eq!(report.total_sentences, 1);
        assert_eq!(report.details[0].best_marker, None);
        assert_eq!(report.details[0].best_score, None);
        assert!(report.details[0].supported);
    }

    #[test]
    fn test_boilerplate_passthrough_uncounted() {
        let answer = "Was this answer helpful?\nYes, it was.\nA building permit is required for any structure over 200 square feet.";
        let (annotated, report) = verify_answer_support(answer, &sources(), DEFAULT_MIN_SUPPORT);
        assert!(annotated.starts_with("Was this answer helpful?\nYes, it was.\n"));
        assert_eq!(report.total_sentences, 1);
        assert_eq!(report.supported, 1);
        assert_eq!(report.details.len(), 1);
    }

    #[test]
    fn test_empty_answer_or_sources_vacuous() {
        let (text, report) = verify_answer_support("", &sources(), DEFAULT_MIN_SUPPORT);
        assert_eq!(text, "");
        assert_eq!(report.total_sentences, 0);

        let (text, report) = verify_answer_support("Some answer.", &[], DEFAULT_MIN_SUPPORT);
        assert_eq!(text, "Some answer.");
        assert_eq!(report.total_sentences, 0);
        assert!(report.details.is_empty());
    }

    #[test]
    fn test_bullet_list_verified_per_bullet() {
        let answer = "- a minor subdivision divides land into three lots or fewer\n- nonsense claim about weather";
        let (annotated, report) = verify_answer_support(answer, &sources(), DEFAULT_MIN_SUPPORT);
        let lines: Vec<&str> = annotated.split('\n').collect();
        assert!(lines[0].ends_with("[1]"));
        assert!(lines[1].ends_with("(insufficient support)"));
        assert_eq!(report.total_sentences, 2);
    }
}
