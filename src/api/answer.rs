use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::Json;
use futures_util::stream::{self, Stream, StreamExt};
use serde_json::json;

use crate::models::{AnswerRequest, AnswerResponse};
use crate::rag::lexical::truncate_chars;
use crate::rag::pipeline::answer_query;
use crate::rag::prompt::{build_prompt, sourceless_prompt};
use crate::rag::retrieve::retrieve;
use crate::rag::MAX_CHUNK_CHARS;
use crate::state::AppState;

const MAX_QUERY_CHARS: usize = 2000;
const IDLE_TIMEOUT_SECS: u64 = 30;

/// POST /rag/answer — run the full pipeline and return the annotated answer.
pub async fn answer(
    State(state): State<AppState>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, (StatusCode, String)> {
    let req = validate(req)?;

    let _permit = state
        .answer_semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Answer service at capacity".to_string(),
            )
        })?;

    let response = answer_query(state.search.as_ref(), state.generator.as_ref(), &req)
        .await
        .map_err(|e| {
            tracing::error!("Answer pipeline failed: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Generation failed: {e:#}"),
            )
        })?;

    Ok(Json(response))
}

/// GET /rag/answer/stream — browser-friendly variant taking query parameters.
pub async fn answer_stream_get(
    State(state): State<AppState>,
    Query(req): Query<AnswerRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    stream_answer(state, req).await
}

/// POST /rag/answer/stream
pub async fn answer_stream_post(
    State(state): State<AppState>,
    Json(req): Json<AnswerRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    stream_answer(state, req).await
}

/// Stream tokens as SSE events. Citation and verification need the complete
/// answer, so the stream route carries no final citations; callers wanting
/// them use the JSON route.
async fn stream_answer(
    state: AppState,
    req: AnswerRequest,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    let req = validate(req)?;

    let permit = state
        .answer_semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Answer service at capacity".to_string(),
            )
        })?;

    let (results, used_query) =
        retrieve(state.search.as_ref(), &req.query, &req.collection, req.num_results).await;
    let prompt = if results.is_empty() {
        sourceless_prompt(&req.query)
    } else {
        build_prompt(&req.query, &results, MAX_CHUNK_CHARS).0
    };

    let params = req.generation_params();
    let llm_stream = state
        .generator
        .stream_generate(&prompt, &params)
        .await
        .map_err(|e| {
            tracing::error!("Failed to start generation: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Generation failed: {e}"),
            )
        })?;

    let start_event: Result<Event, Infallible> = Ok(Event::default()
        .event("start")
        .json_data(json!({ "collection": req.collection, "used_query": used_query }))
        .unwrap());

    // Comment padding defeats buffering in certain proxies and browsers
    let padding_event: Result<Event, Infallible> = Ok(Event::default().comment(" ".repeat(2048)));

    let idle_timeout = Duration::from_secs(IDLE_TIMEOUT_SECS);
    let token_stream = stream::unfold(
        (llm_stream, idle_timeout, false),
        |(mut llm_stream, timeout, done)| async move {
            if done {
                return None;
            }
            match tokio::time::timeout(timeout, llm_stream.next()).await {
                Ok(Some(Ok(text))) => {
                    let event: Result<Event, Infallible> = Ok(Event::default()
                        .event("token")
                        .json_data(json!({ "text": text }))
                        .unwrap());
                    Some((event, (llm_stream, timeout, false)))
                }
                Ok(Some(Err(e))) => {
                    let event: Result<Event, Infallible> = Ok(Event::default()
                        .event("error")
                        .json_data(json!({ "message": e.to_string() }))
                        .unwrap());
                    Some((event, (llm_stream, timeout, true)))
                }
                Ok(None) => None, // Stream ended naturally
                Err(_) => {
                    let event: Result<Event, Infallible> = Ok(Event::default()
                        .event("error")
                        .json_data(json!({ "message": "Generation timed out (idle)" }))
                        .unwrap());
                    Some((event, (llm_stream, timeout, true)))
                }
            }
        },
    );

    let end_event: Result<Event, Infallible> = Ok(Event::default()
        .event("end")
        .json_data(json!({ "answer": null, "citations": [], "sources": [] }))
        .unwrap());

    let event_stream = stream::iter([start_event, padding_event])
        .chain(token_stream)
        .chain(stream::once(async move { end_event }));

    // Hold the semaphore permit for the lifetime of the stream
    let event_stream = event_stream.map(move |event| {
        let _permit = &permit;
        event
    });

    Ok(Sse::new(event_stream))
}

/// Reject empty queries, cap overlong ones at a char boundary.
fn validate(mut req: AnswerRequest) -> Result<AnswerRequest, (StatusCode, String)> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "query is required".to_string()));
    }
    let capped = truncate_chars(query, MAX_QUERY_CHARS).to_string();
    req.query = capped;
    Ok(req)
}
