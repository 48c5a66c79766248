//! # landuse-rag
//!
//! A Rust web service that answers questions about county land-use code and
//! property assessor records with a retrieval-augmented generation pipeline:
//! semantic search against an external vector-search service, grounded prompt
//! construction, streaming LLM completion, and post-hoc citation and
//! verification of the generated answer.
//!
//! ## Architecture
//!
//! The answer pipeline is a straight line with one retry loop:
//!
//! ```text
//!                    ┌──────────────┐
//!                    │  User Query   │
//!                    └──────┬───────┘
//!                           │
//!                           ▼
//!                ┌─────────────────────┐
//!                │  Query Normalizer   │
//!                │ rule table, 1 match │
//!                └──────────┬──────────┘
//!                           │ + fallback variations
//!                           ▼
//!          ┌──────────────────────────────────┐
//!          │   Retrieval Orchestrator          │
//!          │   per variation, until non-empty: │
//!          │   search → expand refs → rerank   │
//!          └──────────────┬───────────────────┘
//!                         │ ≤ 6 diverse chunks
//!                         ▼
//!              ┌──────────────────────┐
//!              │    Prompt Builder     │
//!              │ enumerated SOURCES,   │
//!              │ [n] citation contract │
//!              └──────────┬───────────┘
//!                         │
//!                         ▼
//!              ┌──────────────────────┐
//!              │  Streaming LLM call   │
//!              │ tokens accumulated    │
//!              └──────────┬───────────┘
//!                         │ full answer text
//!                         ▼
//!              ┌──────────────────────┐
//!              │ Citation Extractor    │
//!              │ auto-cite fallback    │
//!              └──────────┬───────────┘
//!                         │
//!                         ▼
//!              ┌──────────────────────┐
//!              │   Answer Verifier     │
//!              │ per-sentence support  │
//!              └──────────┬───────────┘
//!                         │
//!                         ▼
//!              ┌──────────────────────┐
//!              │ Annotated answer +    │
//!              │ citations + report    │
//!              └──────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, search service, and LLM settings
//! - [`models`] - Shared data types: `RetrievedChunk`, `SourceChunk`, `Citation`, verification reports
//! - [`query`] - Query normalization (first-match-wins rewrite rules) and fallback variations
//! - [`rag`] - The deterministic pipeline core: lexical similarity, reranking, retrieval
//!   orchestration, prompt building, citation extraction, answer verification
//! - [`search`] - `SearchBackend` trait plus the HTTP client for the external search service,
//!   including cross-reference expansion
//! - [`llm`] - `Generator` trait plus streaming completion clients (Ollama / OpenAI-compatible)
//! - [`api`] - Axum HTTP handlers for health, config, and the answer endpoints (JSON + SSE)
//! - [`state`] - Shared application state holding config, clients, and the answer semaphore

pub mod api;
pub mod config;
pub mod llm;
pub mod models;
pub mod query;
pub mod rag;
pub mod search;
pub mod state;
