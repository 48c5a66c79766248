use serde::{Deserialize, Serialize};

/// Collections served by the search service.
pub const AVAILABLE_COLLECTIONS: [&str; 2] = ["la_plata_county_code", "la_plata_assessor"];

/// Collection used when a request does not name one.
pub const DEFAULT_COLLECTION: &str = "la_plata_county_code";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// External search service configuration
    pub search: SearchConfig,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Maximum concurrent answer generations
    pub max_concurrent_answers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the search service (e.g. "http://localhost:8000")
    pub base_url: String,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for answer generation
    pub model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8001".to_string(),
            search: SearchConfig::default(),
            llm: LlmConfig::default(),
            max_concurrent_answers: 3,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 20,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            model: "qwen3:4b".to_string(),
            api_key: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("RAG_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(url) = std::env::var("SEARCH_BASE_URL") {
            config.search.base_url = url;
        }
        if let Ok(val) = std::env::var("SEARCH_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.search.timeout_secs = v;
            }
        }
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            config.llm.model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(val) = std::env::var("RAG_MAX_CONCURRENT_ANSWERS") {
            if let Ok(v) = val.parse() {
                config.max_concurrent_answers = v;
            }
        }

        config
    }
}
