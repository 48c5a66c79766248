//! The retrieval collaborator boundary. The orchestrator only ever talks to
//! [`SearchBackend`], so the pipeline can run against the real search service
//! or a stub in tests.

pub mod client;
pub mod expand;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::RetrievedChunk;

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Semantic search against one collection. Bounded by the client timeout;
    /// errors are recovered per query variation by the orchestrator.
    async fn search(
        &self,
        query: &str,
        collection: &str,
        num_results: usize,
    ) -> Result<Vec<RetrievedChunk>>;

    /// Enrich `results` with chunks for sections their text cross-references.
    /// Best-effort: a failure aborts the current query variation only.
    async fn expand(
        &self,
        query: &str,
        results: Vec<RetrievedChunk>,
        collection: &str,
    ) -> Result<Vec<RetrievedChunk>>;
}
