//! The composed answer pipeline: one call chaining retrieval, prompt
//! construction, streaming generation, citation handling, and verification.
//! This is the operation an HTTP handler invokes.

use anyhow::{Context, Result};
use futures_util::StreamExt;

use crate::llm::Generator;
use crate::models::{AnswerRequest, AnswerResponse};
use crate::rag::cite::{auto_cite_answer, extract_citations, DEFAULT_MIN_JACCARD};
use crate::rag::prompt::{build_prompt, sourceless_prompt};
use crate::rag::retrieve::retrieve;
use crate::rag::verify::{verify_answer_support, DEFAULT_MIN_SUPPORT};
use crate::rag::MAX_CHUNK_CHARS;
use crate::search::SearchBackend;

/// Run the full pipeline for one request.
///
/// Retrieval failures degrade to a sourceless prompt; a generation failure is
/// a hard error and no citation or verification work runs on the partial
/// text. Verification scores the answer against the sources it actually
/// cites, not the whole retrieved set.
pub async fn answer_query<S, G>(
    search: &S,
    generator: &G,
    req: &AnswerRequest,
) -> Result<AnswerResponse>
where
    S: SearchBackend + ?Sized,
    G: Generator + ?Sized,
{
    let (results, used_query) = retrieve(search, &req.query, &req.collection, req.num_results).await;

    let (prompt, sources) = if results.is_empty() {
        (sourceless_prompt(&req.query), Vec::new())
    } else {
        build_prompt(&req.query, &results, MAX_CHUNK_CHARS)
    };
    tracing::debug!(
        "Answering '{used_query}' with {} source(s)",
        sources.len()
    );

    let params = req.generation_params();
    let mut stream = generator
        .stream_generate(&prompt, &params)
        .await
        .context("Failed to start generation")?;

    let mut answer_text = String::new();
    while let Some(token) = stream.next().await {
        answer_text.push_str(&token.context("Generation stream failed")?);
    }
    let mut answer_text = answer_text.trim().to_string();

    let (mut citations, mut used_sources) = extract_citations(&answer_text, &sources);
    if citations.is_empty() && !sources.is_empty() {
        (answer_text, citations, used_sources) =
            auto_cite_answer(&answer_text, &sources, DEFAULT_MIN_JACCARD);
    }

    let (annotated, verification) =
        verify_answer_support(&answer_text, &used_sources, DEFAULT_MIN_SUPPORT);

    Ok(AnswerResponse {
        query: req.query.clone(),
        collection: req.collection.clone(),
        num_results: req.num_results,
        answer: annotated,
        citations,
        sources: used_sources,
        verification,
    })
}
