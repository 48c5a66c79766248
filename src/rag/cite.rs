//! Citation extraction and best-effort auto-citation.
//!
//! The model is instructed to cite with `[n]` markers; when it does,
//! extraction maps the markers back to sources. When it answers without
//! markers, auto-citation attaches them by lexical match so the caller always
//! receives at least one citation whenever sources exist.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{Citation, SourceChunk};
use crate::rag::lexical::{jaccard, tokenize};

/// Minimum Jaccard overlap for auto-citation to attach a marker to a line.
pub const DEFAULT_MIN_JACCARD: f32 = 0.05;

pub(crate) fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(\d+)\]").expect("valid marker regex"))
}

/// Parse `[n]` markers from the answer and map them to sources.
///
/// Returns `(citations, used_sources)` sorted ascending by marker value.
/// Markers that resolve to no source index are silently dropped.
pub fn extract_citations(
    answer_text: &str,
    sources: &[SourceChunk],
) -> (Vec<Citation>, Vec<SourceChunk>) {
    if answer_text.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let mut markers: BTreeSet<usize> = BTreeSet::new();
    for caps in marker_re().captures_iter(answer_text) {
        if let Some(m) = caps.get(1) {
            if let Ok(idx) = m.as_str().parse::<usize>() {
                if idx >= 1 {
                    markers.insert(idx);
                }
            }
        }
    }

    let mut citations = Vec::new();
    let mut used_sources = Vec::new();
    for marker in markers {
        let Some(src) = sources.iter().find(|s| s.index == marker) else {
            continue;
        };
        citations.push(Citation {
            marker,
            id: src.id.clone(),
            collection: src.collection.clone(),
        });
        used_sources.push(src.clone());
    }

    (citations, used_sources)
}

/// Best-effort citation insertion when the model omitted `[n]` markers.
///
/// Each non-empty line without a marker gets the best-matching source
/// appended when the overlap clears `min_jaccard`. If no line clears the
/// threshold, `[1]` is attached to the first non-blank line so at least one
/// citation exists. The returned citations are always re-parsed from the
/// modified text, never hand-assembled.
pub fn auto_cite_answer(
    answer_text: &str,
    sources: &[SourceChunk],
    min_jaccard: f32,
) -> (String, Vec<Citation>, Vec<SourceChunk>) {
    if answer_text.is_empty() || sources.is_empty() {
        return (answer_text.to_string(), Vec::new(), Vec::new());
    }

    let src_tokens = tokenize_sources(sources);

    let mut new_lines: Vec<String> = Vec::new();
    for line in answer_text.split('\n') {
        let stripped = line.trim();
        if stripped.is_empty() || marker_re().is_match(line) {
            new_lines.push(line.to_string());
            continue;
        }

        let tokens = tokenize(stripped);
        match best_match(&tokens, &src_tokens) {
            Some((idx, score)) if score >= min_jaccard => {
                new_lines.push(append_marker(line, idx));
            }
            _ => new_lines.push(line.to_string()),
        }
    }

    let mut new_answer = new_lines.join("\n");
    let (mut citations, mut used_sources) = extract_citations(&new_answer, sources);

    // Degenerate case: nothing cleared the threshold. Attach [1] to the first
    // non-blank line as a minimal fallback.
    if citations.is_empty() {
        if let Some(pos) = new_lines.iter().position(|l| !l.trim().is_empty()) {
            new_lines[pos] = append_marker(&new_lines[pos], 1);
        }
        new_answer = new_lines.join("\n");
        (citations, used_sources) = extract_citations(&new_answer, sources);
    }

    (new_answer, citations, used_sources)
}

/// Append a `[idx]` marker, keeping the line's trailing whitespace convention.
pub(crate) fn append_marker(line: &str, idx: usize) -> String {
    if line.ends_with(' ') {
        format!("{line}[{idx}]")
    } else {
        format!("{line} [{idx}]")
    }
}

/// Pre-tokenized source chunks, preview as fallback for an empty chunk.
pub(crate) fn tokenize_sources(sources: &[SourceChunk]) -> Vec<(usize, Vec<String>)> {
    sources
        .iter()
        .map(|s| {
            let text = if s.chunk.is_empty() { &s.preview } else { &s.chunk };
            (s.index, tokenize(text))
        })
        .collect()
}

/// Best-scoring source for the given tokens; strictly-positive winner only.
pub(crate) fn best_match(
    tokens: &[String],
    src_tokens: &[(usize, Vec<String>)],
) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, toks) in src_tokens {
        let score = jaccard(tokens, toks);
        if score > best.map_or(0.0, |(_, s)| s) {
            best = Some((*idx, score));
        }
    }
    best
}
