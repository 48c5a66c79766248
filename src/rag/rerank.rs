//! Heuristic reranking: lexical overlap with the query blended with the
//! search service's own relevance score, then greedy diversity selection to
//! suppress near-duplicate chunks.

use std::cmp::Ordering;

use crate::models::RetrievedChunk;
use crate::rag::lexical::{jaccard, tokenize, truncate_chars};
use crate::rag::MAX_CHUNK_CHARS;

/// Rerank never returns more than this many chunks.
pub const DEFAULT_TOP_K: usize = 6;

/// Candidates at or above this Jaccard similarity to an already-selected
/// chunk are treated as redundant.
pub const DEFAULT_DIVERSITY_THRESHOLD: f32 = 0.8;

/// Select up to `top_k` chunks, scored by
/// `0.7 * jaccard(query, chunk) + 0.3 * relevance`, skipping near-duplicates.
/// Diversity is best-effort: if the redundancy filter leaves slots open and
/// candidates remain, they are backfilled in score order without the check.
pub fn rerank_results(
    query: &str,
    results: Vec<RetrievedChunk>,
    top_k: usize,
    diversity_threshold: f32,
) -> Vec<RetrievedChunk> {
    let q_tokens = tokenize(query);

    let mut scored: Vec<(f32, usize, Vec<String>)> = results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let tokens = tokenize(truncate_chars(&r.text, MAX_CHUNK_CHARS));
            let overlap = jaccard(&q_tokens, &tokens);
            // Emphasize overlap, keep some weight for service-provided relevance
            let score = 0.7 * overlap + 0.3 * r.relevance;
            (score, i, tokens)
        })
        .collect();

    // Stable sort: input order is preserved among equal scores.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    let mut selected: Vec<usize> = Vec::new();
    let mut selected_tokens: Vec<&Vec<String>> = Vec::new();

    for (_, i, tokens) in &scored {
        if selected.len() >= top_k {
            break;
        }
        let redundant = selected_tokens
            .iter()
            .any(|sel| jaccard(tokens, sel) >= diversity_threshold);
        if redundant {
            continue;
        }
        selected.push(*i);
        selected_tokens.push(tokens);
    }

    // If diversity dropped the count too low, fill from the remainder without checks
    if selected.len() < top_k.min(scored.len()) {
        for (_, i, _) in &scored {
            if selected.len() >= top_k {
                break;
            }
            if !selected.contains(i) {
                selected.push(*i);
            }
        }
    }

    let mut slots: Vec<Option<RetrievedChunk>> = results.into_iter().map(Some).collect();
    selected
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}
