use std::sync::Arc;

use crate::config::Config;
use crate::llm::generate::HttpGenerator;
use crate::search::client::HttpSearchClient;

/// Shared application state. Everything here is immutable after startup; the
/// pipeline itself is stateless per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub search: Arc<HttpSearchClient>,
    pub generator: Arc<HttpGenerator>,
    pub answer_semaphore: Arc<tokio::sync::Semaphore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        let search = Arc::new(HttpSearchClient::new(
            http_client.clone(),
            config.search.clone(),
        ));
        let generator = Arc::new(HttpGenerator::new(http_client, config.llm.clone()));
        let answer_semaphore = Arc::new(tokio::sync::Semaphore::new(config.max_concurrent_answers));

        Ok(Self {
            config,
            search,
            generator,
            answer_semaphore,
        })
    }
}
