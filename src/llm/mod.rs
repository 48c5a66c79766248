//! The generation collaborator boundary. The pipeline consumes a token
//! stream through [`Generator`] and never sees provider specifics.

pub mod generate;

use std::pin::Pin;

use anyhow::Result;
use async_trait::async_trait;
use futures_util::stream::Stream;

use crate::models::GenerationParams;

/// A stream of content tokens, in yield order.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[async_trait]
pub trait Generator: Send + Sync {
    /// Start a streaming completion for `prompt`. The caller concatenates
    /// tokens with no reordering; an `Err` item is terminal for the request.
    async fn stream_generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<TokenStream>;
}
