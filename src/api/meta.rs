use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::config::AVAILABLE_COLLECTIONS;
use crate::state::AppState;

/// GET / — service index.
pub async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "name": "La Plata County RAG API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "RAG answer endpoints with SSE streaming",
        "endpoints": {
            "/rag/health": "Health check",
            "/rag/config": "RAG configuration",
            "/rag/answer": "Non-streaming answer",
            "/rag/answer/stream": "SSE streaming answer",
        },
    }))
}

/// GET /rag/health
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "search_service": state.config.search.base_url,
        "llm_provider": state.config.llm.provider,
        "llm_base_url": state.config.llm.base_url,
        "streaming": true,
        "endpoints": [
            "/rag/health",
            "/rag/config",
            "/rag/answer",
            "/rag/answer/stream",
        ],
    }))
}

/// GET /rag/config — configuration summary with the API key redacted.
pub async fn rag_config(State(state): State<AppState>) -> Json<RagConfigResponse> {
    let config = &state.config;
    Json(RagConfigResponse {
        service: "RAG API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: ModelConfigResponse {
            provider: config.llm.provider.clone(),
            base_url: config.llm.base_url.clone(),
            model: config.llm.model.clone(),
            has_api_key: config.llm.api_key.is_some(),
        },
        retrieval: RetrievalConfigResponse {
            search_service: config.search.base_url.clone(),
            collections: AVAILABLE_COLLECTIONS.iter().map(|c| c.to_string()).collect(),
            rerank: "heuristic v1 (lexical overlap + relevance, diversity filter)".to_string(),
        },
    })
}

#[derive(serde::Serialize)]
pub struct RagConfigResponse {
    pub service: String,
    pub version: String,
    pub model: ModelConfigResponse,
    pub retrieval: RetrievalConfigResponse,
}

#[derive(serde::Serialize)]
pub struct ModelConfigResponse {
    pub provider: String,
    pub base_url: String,
    pub model: String,
    pub has_api_key: bool,
}

#[derive(serde::Serialize)]
pub struct RetrievalConfigResponse {
    pub search_service: String,
    pub collections: Vec<String>,
    pub rerank: String,
}
