//! Streaming completion clients for the two supported LLM backends:
//! Ollama's `/api/generate` (ndjson) and any OpenAI-compatible
//! `/v1/completions` endpoint (SSE).

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::llm::{Generator, TokenStream};
use crate::models::GenerationParams;

const GENERATION_TIMEOUT_SECS: u64 = 300;

/// [`Generator`] backed by an HTTP LLM service.
#[derive(Clone)]
pub struct HttpGenerator {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpGenerator {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn stream_generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<TokenStream> {
        match self.config.provider.as_str() {
            "ollama" => stream_ollama(&self.client, &self.config, prompt, params).await,
            "openai" => stream_openai(&self.client, &self.config, prompt, params).await,
            other => anyhow::bail!("Unsupported LLM provider for generation: {other}"),
        }
    }
}

// ─── Ollama streaming ────────────────────────────────────

#[derive(Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    num_predict: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct OllamaGenerateChunk {
    #[serde(default)]
    response: String,
    done: bool,
}

async fn stream_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    prompt: &str,
    params: &GenerationParams,
) -> Result<TokenStream> {
    let url = format!("{}/api/generate", config.base_url);

    let req = OllamaGenerateRequest {
        model: config.model.clone(),
        prompt: prompt.to_string(),
        stream: true,
        options: OllamaOptions {
            num_predict: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
        },
    };

    let resp = client
        .post(&url)
        .timeout(Duration::from_secs(GENERATION_TIMEOUT_SECS))
        .json(&req)
        .send()
        .await
        .context("Failed to connect to Ollama for generation")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Ollama generate API returned {status}: {body}");
    }

    let stream = stream_lines(resp.bytes_stream()).filter_map(|line_result| async move {
        match line_result {
            Ok(line) => parse_ollama_line(&line),
            Err(e) => Some(Err(e)),
        }
    });

    Ok(Box::pin(stream))
}

/// Parse a single Ollama ndjson line. Returns:
/// - Some(Ok(text)) for content
/// - Some(Err(e)) for parse errors
/// - None to skip (empty response or done signal)
fn parse_ollama_line(line: &str) -> Option<Result<String>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<OllamaGenerateChunk>(line) {
        Ok(chunk) => {
            if chunk.done || chunk.response.is_empty() {
                return None;
            }
            Some(Ok(chunk.response))
        }
        Err(e) => Some(Err(anyhow::anyhow!("Failed to parse Ollama chunk: {e}"))),
    }
}

// ─── OpenAI-compatible streaming ─────────────────────────

#[derive(Serialize)]
struct OpenAiCompletionRequest {
    model: String,
    prompt: String,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAiCompletionChunk {
    choices: Vec<OpenAiCompletionChoice>,
}

#[derive(Deserialize)]
struct OpenAiCompletionChoice {
    text: Option<String>,
}

async fn stream_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    prompt: &str,
    params: &GenerationParams,
) -> Result<TokenStream> {
    let url = format!("{}/v1/completions", config.base_url);

    let req = OpenAiCompletionRequest {
        model: config.model.clone(),
        prompt: prompt.to_string(),
        max_tokens: params.max_tokens,
        temperature: params.temperature,
        top_p: params.top_p,
        stream: true,
    };

    let resp = client
        .post(&url)
        .timeout(Duration::from_secs(GENERATION_TIMEOUT_SECS))
        .header(
            "Authorization",
            format!("Bearer {}", config.api_key.as_deref().unwrap_or("")),
        )
        .json(&req)
        .send()
        .await
        .context("Failed to connect to completion endpoint")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Completion API returned {status}: {body}");
    }

    let stream = stream_lines(resp.bytes_stream()).filter_map(|line_result| async move {
        match line_result {
            Ok(line) => parse_openai_line(&line),
            Err(e) => Some(Err(e)),
        }
    });

    Ok(Box::pin(stream))
}

/// Parse a single SSE line from an OpenAI-compatible endpoint. Returns:
/// - Some(Ok(text)) for content
/// - Some(Err(e)) for parse errors
/// - None to skip (non-data lines, [DONE], empty text)
fn parse_openai_line(line: &str) -> Option<Result<String>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let data = line.strip_prefix("data: ")?.trim();
    if data == "[DONE]" {
        return None;
    }

    match serde_json::from_str::<OpenAiCompletionChunk>(data) {
        Ok(chunk) => {
            let text = chunk
                .choices
                .first()
                .and_then(|c| c.text.clone())
                .unwrap_or_default();
            if text.is_empty() {
                return None;
            }
            Some(Ok(text))
        }
        Err(e) => Some(Err(anyhow::anyhow!("Failed to parse completion chunk: {e}"))),
    }
}

// ─── Line buffering ──────────────────────────────────────

/// Convert a byte stream into a stream of complete lines.
fn stream_lines(
    byte_stream: impl Stream<Item = reqwest::Result<bytes::Bytes>> + Send + 'static,
) -> impl Stream<Item = Result<String>> + Send {
    futures_util::stream::unfold(
        (Box::pin(byte_stream), String::new()),
        |(mut stream, mut buffer)| async move {
            loop {
                // Drain any complete line already buffered
                if let Some(newline_pos) = buffer.find('\n') {
                    let line = buffer[..newline_pos].to_string();
                    buffer = buffer[newline_pos + 1..].to_string();
                    if !line.trim().is_empty() {
                        return Some((Ok(line), (stream, buffer)));
                    }
                    continue;
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                    }
                    Some(Err(e)) => {
                        return Some((
                            Err(anyhow::anyhow!("Stream read error: {e}")),
                            (stream, buffer),
                        ));
                    }
                    None => {
                        // Stream ended; emit whatever remains
                        if !buffer.trim().is_empty() {
                            let remaining = std::mem::take(&mut buffer);
                            return Some((Ok(remaining), (stream, buffer)));
                        }
                        return None;
                    }
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─── Ollama parsing ──────────────────────────────────

    #[test]
    fn test_parse_ollama_chunk() {
        let line = r#"{"response":"A minor","done":false}"#;
        let result = parse_ollama_line(line);
        assert_eq!(result.unwrap().unwrap(), "A minor");
    }

    #[test]
    fn test_parse_ollama_done() {
        let line = r#"{"response":"","done":true}"#;
        assert!(parse_ollama_line(line).is_none());
    }

    #[test]
    fn test_parse_ollama_empty_response() {
        let line = r#"{"response":"","done":false}"#;
        assert!(parse_ollama_line(line).is_none());
    }

    #[test]
    fn test_parse_ollama_malformed() {
        let result = parse_ollama_line("not valid json{{{");
        assert!(result.unwrap().is_err());
    }

    // ─── OpenAI parsing ──────────────────────────────────

    #[test]
    fn test_parse_openai_data_line() {
        let line = r#"data: {"choices":[{"text":"subdivision"}]}"#;
        let result = parse_openai_line(line);
        assert_eq!(result.unwrap().unwrap(), "subdivision");
    }

    #[test]
    fn test_parse_openai_done() {
        assert!(parse_openai_line("data: [DONE]").is_none());
    }

    #[test]
    fn test_parse_openai_empty_text() {
        let line = r#"data: {"choices":[{"text":null}]}"#;
        assert!(parse_openai_line(line).is_none());
    }

    #[test]
    fn test_parse_openai_non_data_line() {
        assert!(parse_openai_line("event: message").is_none());
    }

    #[test]
    fn test_parse_openai_malformed() {
        let result = parse_openai_line("data: {broken json");
        assert!(result.unwrap().is_err());
    }

    // ─── Edge cases ──────────────────────────────────────

    #[test]
    fn test_parse_empty_line() {
        assert!(parse_ollama_line("").is_none());
        assert!(parse_openai_line("").is_none());
    }

    #[test]
    fn test_parse_whitespace_line() {
        assert!(parse_ollama_line("   ").is_none());
        assert!(parse_openai_line("   ").is_none());
    }
}
