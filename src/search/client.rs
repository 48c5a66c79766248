//! HTTP client for the external semantic-search service.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SearchConfig;
use crate::models::RetrievedChunk;
use crate::search::expand::expand_with_references;
use crate::search::SearchBackend;

#[derive(Clone)]
pub struct HttpSearchClient {
    client: reqwest::Client,
    config: SearchConfig,
}

#[derive(Deserialize)]
struct SimpleSearchResponse {
    #[serde(default)]
    results: Vec<RawSearchResult>,
}

/// One result as the search service reports it. The identifier key depends on
/// the collection (`section` for code, `account` for assessor records), and
/// `relevance` may arrive as a JSON number, a formatted string, or `"N/A"`.
#[derive(Deserialize)]
struct RawSearchResult {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    relevance: Option<serde_json::Value>,
    #[serde(default)]
    section: Option<String>,
    #[serde(default)]
    account: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    collection: Option<String>,
}

impl RawSearchResult {
    fn into_chunk(self, fallback_collection: &str) -> RetrievedChunk {
        let id = self
            .section
            .or(self.account)
            .or(self.id)
            .unwrap_or_else(|| "unknown".to_string());
        RetrievedChunk {
            id,
            collection: self
                .collection
                .unwrap_or_else(|| fallback_collection.to_string()),
            text: self.text.unwrap_or_default(),
            relevance: parse_relevance(self.relevance.as_ref()),
        }
    }
}

/// Tolerant relevance parsing; anything unusable becomes 0.0.
fn parse_relevance(value: Option<&serde_json::Value>) -> f32 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0) as f32,
        Some(serde_json::Value::String(s)) => s.trim().parse::<f32>().unwrap_or(0.0),
        _ => 0.0,
    }
}

impl HttpSearchClient {
    pub fn new(client: reqwest::Client, config: SearchConfig) -> Self {
        Self { client, config }
    }

    pub(crate) async fn simple_search(
        &self,
        query: &str,
        collection: &str,
        num_results: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let url = format!("{}/search/simple", self.config.base_url);
        let clamped = num_results.clamp(1, 10);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("query", query),
                ("collection", collection),
                ("num_results", &clamped.to_string()),
            ])
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .send()
            .await
            .context("Failed to reach search service")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Search service returned {status}: {body}");
        }

        let body: SimpleSearchResponse = resp
            .json()
            .await
            .context("Failed to decode search response")?;

        Ok(body
            .results
            .into_iter()
            .map(|r| r.into_chunk(collection))
            .collect())
    }
}

#[async_trait]
impl SearchBackend for HttpSearchClient {
    async fn search(
        &self,
        query: &str,
        collection: &str,
        num_results: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        self.simple_search(query, collection, num_results).await
    }

    async fn expand(
        &self,
        query: &str,
        results: Vec<RetrievedChunk>,
        collection: &str,
    ) -> Result<Vec<RetrievedChunk>> {
        expand_with_references(self, query, results, collection).await
    }
}
