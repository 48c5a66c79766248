use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use landuse_rag::api;
use landuse_rag::config::Config;
use landuse_rag::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Search service: {}", config.search.base_url);
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);

    let state = AppState::new(config.clone())?;

    let app = Router::new()
        .route("/", get(api::meta::index))
        .route("/rag/health", get(api::meta::health))
        .route("/rag/config", get(api::meta::rag_config))
        .route("/rag/answer", post(api::answer::answer))
        .route(
            "/rag/answer/stream",
            get(api::answer::answer_stream_get).post(api::answer::answer_stream_post),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
