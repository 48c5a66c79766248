use serde::{Deserialize, Serialize};

/// A passage returned by the search service, after tolerant parsing.
/// The identifier is whichever of `section` / `account` / `id` the service
/// reported; `relevance` defaults to 0.0 when absent or unparseable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub collection: String,
    pub text: String,
    pub relevance: f32,
}

/// Prompt-side source metadata. `index` is 1-based and matches the `[n]`
/// numbering used in the prompt's SOURCES list exactly; it is the single
/// source of truth for citation resolution and verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceChunk {
    pub index: usize,
    pub collection: String,
    pub id: String,
    /// First 200 characters of the chunk, for UI display.
    pub preview: String,
    /// Chunk text as it appeared in the prompt (truncated).
    pub chunk: String,
}

/// A `[n]` marker resolved against the source list for the current request.
/// Markers with no matching source index are dropped, never fabricated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub marker: usize,
    pub id: String,
    pub collection: String,
}

/// Per-sentence outcome of answer verification. A sentence that already
/// carried a citation marker is trusted: `supported` with no `best_marker`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationDetail {
    pub index: usize,
    pub best_marker: Option<usize>,
    pub best_score: Option<f32>,
    pub supported: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationReport {
    pub total_sentences: usize,
    pub supported: usize,
    pub unsupported: usize,
    pub details: Vec<VerificationDetail>,
}

/// Sampling parameters forwarded to the generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 1200,
            temperature: 0.2,
            top_p: 0.9,
        }
    }
}

/// Answer request, shared by the JSON and SSE routes.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerRequest {
    pub query: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_num_results")]
    pub num_results: usize,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}

fn default_collection() -> String {
    crate::config::DEFAULT_COLLECTION.to_string()
}

fn default_num_results() -> usize {
    5
}

impl AnswerRequest {
    /// Resolve per-request sampling overrides against the defaults.
    pub fn generation_params(&self) -> GenerationParams {
        let defaults = GenerationParams::default();
        GenerationParams {
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            top_p: self.top_p.unwrap_or(defaults.top_p),
        }
    }
}

/// Answer response
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResponse {
    pub query: String,
    pub collection: String,
    pub num_results: usize,
    pub answer: String,
    pub citations: Vec<Citation>,
    pub sources: Vec<SourceChunk>,
    pub verification: VerificationReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_request_defaults() {
        let req: AnswerRequest = serde_json::from_str(r#"{"query": "deck permit"}"#).unwrap();
        assert_eq!(req.collection, "la_plata_county_code");
        assert_eq!(req.num_results, 5);
        assert!(req.max_tokens.is_none());
    }

    #[test]
    fn test_generation_params_merge_overrides() {
        let req: AnswerRequest =
            serde_json::from_str(r#"{"query": "q", "max_tokens": 64, "temperature": 0.7}"#)
                .unwrap();
        let params = req.generation_params();
        assert_eq!(params.max_tokens, 64);
        assert_eq!(params.temperature, 0.7);
        assert_eq!(params.top_p, 0.9);
    }

    #[test]
    fn test_verification_report_default_is_empty() {
        let report = VerificationReport::default();
        assert_eq!(report.total_sentences, 0);
        assert_eq!(report.supported + report.unsupported, report.total_sentences);
        assert!(report.details.is_empty());
    }
}
