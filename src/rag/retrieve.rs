//! Retrieval orchestration: normalize the query, then walk the fallback
//! variations until one yields usable, reranked results.

use anyhow::Result;

use crate::models::RetrievedChunk;
use crate::query::normalize::normalize_query;
use crate::query::variations::query_variations;
use crate::rag::rerank::{rerank_results, DEFAULT_DIVERSITY_THRESHOLD, DEFAULT_TOP_K};
use crate::search::SearchBackend;

/// Retrieve chunks for a query, trying each variation in preference order.
///
/// Returns the reranked chunks and the variation string that produced them.
/// A variation whose search or expansion fails is logged and skipped; only a
/// full sweep of failures degrades to `(empty, original_query)` — a single
/// variation's error never propagates to the caller.
pub async fn retrieve<S>(
    search: &S,
    query: &str,
    collection: &str,
    num_results: usize,
) -> (Vec<RetrievedChunk>, String)
where
    S: SearchBackend + ?Sized,
{
    let normalized = normalize_query(query);
    let variations = query_variations(&normalized);

    for (i, variant) in variations.iter().enumerate() {
        match try_variation(search, variant, collection, num_results).await {
            Ok(results) if !results.is_empty() => {
                if i > 0 {
                    tracing::info!(
                        "Query fallback: '{query}' -> '{variant}' (variation {})",
                        i + 1
                    );
                }
                return (results, variant.clone());
            }
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!("Query variation '{variant}' failed: {e:#}");
                continue;
            }
        }
    }

    tracing::warn!("All query variations failed for: '{query}'");
    (Vec::new(), query.to_string())
}

async fn try_variation<S>(
    search: &S,
    variant: &str,
    collection: &str,
    num_results: usize,
) -> Result<Vec<RetrievedChunk>>
where
    S: SearchBackend + ?Sized,
{
    let initial = search.search(variant, collection, num_results).await?;
    if initial.is_empty() {
        return Ok(Vec::new());
    }

    let expanded = search.expand(variant, initial, collection).await?;
    Ok(rerank_results(
        variant,
        expanded,
        num_results.min(DEFAULT_TOP_K),
        DEFAULT_DIVERSITY_THRESHOLD,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Stub backend: maps exact query strings to canned results and records
    /// every query it sees.
    struct StubSearch {
        responses: Vec<(&'static str, Vec<RetrievedChunk>)>,
        failing: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl StubSearch {
        fn new() -> Self {
            Self {
                responses: Vec::new(),
                failing: Vec::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with_response(mut self, query: &'static str, results: Vec<RetrievedChunk>) -> Self {
            self.responses.push((query, results));
            self
        }

        fn with_failure(mut self, query: &'static str) -> Self {
            self.failing.push(query);
            self
        }
    }

    #[async_trait]
    impl SearchBackend for StubSearch {
        async fn search(
            &self,
            query: &str,
            _collection: &str,
            _num_results: usize,
        ) -> Result<Vec<RetrievedChunk>> {
            self.calls.lock().unwrap().push(query.to_string());
            if self.failing.contains(&query) {
                anyhow::bail!("search backend unavailable");
            }
            Ok(self
                .responses
                .iter()
                .find(|(q, _)| *q == query)
                .map(|(_, r)| r.clone())
                .unwrap_or_default())
        }

        async fn expand(
            &self,
            _query: &str,
            results: Vec<RetrievedChunk>,
            _collection: &str,
        ) -> Result<Vec<RetrievedChunk>> {
            Ok(results)
        }
    }

    fn chunk(id: &str, text: &str) -> RetrievedChunk {
        RetrievedChunk {
            id: id.to_string(),
            collection: "la_plata_county_code".to_string(),
            text: text.to_string(),
            relevance: 0.8,
        }
    }

    #[tokio::test]
    async fn test_first_variation_wins() {
        let stub = StubSearch::new().with_response(
            "zoning map",
            vec![chunk("30-1", "zoning map districts")],
        );
        let (results, used) = retrieve(&stub, "zoning map", "la_plata_county_code", 5).await;
        assert_eq!(results.len(), 1);
        assert_eq!(used, "zoning map");
        assert_eq!(stub.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_past_empty_variation() {
        // Normalized query yields nothing; the section-number fallback hits.
        let stub = StubSearch::new().with_response(
            "section 67-4",
            vec![chunk("67-4", "minor subdivision three lots or fewer")],
        );
        let (results, used) = retrieve(
            &stub,
            "What are the requirements for a minor subdivision?",
            "la_plata_county_code",
            5,
        )
        .await;
        assert_eq!(results.len(), 1);
        assert_eq!(used, "section 67-4");
        // Walked the variation list in order to get there.
        let calls = stub.calls.lock().unwrap();
        assert_eq!(calls[0], "a minor subdivision requirements");
        assert!(calls.contains(&"section 67-4".to_string()));
    }

    #[tokio::test]
    async fn test_variation_error_is_recovered() {
        let stub = StubSearch::new()
            .with_failure("a minor subdivision requirements")
            .with_response(
                "minor subdivision requirements",
                vec![chunk("67-4", "minor subdivision three lots or fewer")],
            );
        let (results, used) = retrieve(
            &stub,
            "What are the requirements for a minor subdivision?",
            "la_plata_county_code",
            5,
        )
        .await;
        assert_eq!(results.len(), 1);
        assert_eq!(used, "minor subdivision requirements");
    }

    #[tokio::test]
    async fn test_all_variations_fail_returns_original_query() {
        let stub = StubSearch::new();
        let original = "What are the requirements for a minor subdivision?";
        let (results, used) = retrieve(&stub, original, "la_plata_county_code", 5).await;
        assert!(results.is_empty());
        assert_eq!(used, original);
        // Every variation was attempted.
        assert_eq!(stub.calls.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_results_capped_at_six() {
        let many: Vec<RetrievedChunk> = (0..10)
            .map(|i| chunk(&format!("s{i}"), &format!("distinct zoning text {i}")))
            .collect();
        let stub = StubSearch::new().with_response("zoning", many);
        let (results, _) = retrieve(&stub, "zoning", "la_plata_county_code", 10).await;
        assert!(results.len() <= 6);
    }
}
