//! Text-generation provider
//!
//! The conversation pipeline only needs "prompt in, text out". The provider
//! sits behind [`TextGenerator`] so the orchestrator can be exercised with a
//! scripted generator in tests.

use async_trait::async_trait;
use melody_common::config::GenerationConfig;
use thiserror::Error;

pub mod llmproxy;

pub use llmproxy::LlmProxyClient;

/// Generation provider errors
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Generation request timed out")]
    Timeout,

    #[error("Provider returned {0}: {1}")]
    Status(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// Provider answered but produced no text
    #[error("Provider returned an empty response")]
    Empty,
}

/// Sampling parameters forwarded to the provider unchanged
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub model: String,
    pub temperature: f32,
    /// Prior exchanges kept in provider-side context for the session
    pub lastk: u32,
    pub rag_usage: bool,
    pub rag_threshold: f32,
    pub rag_k: u32,
}

impl From<&GenerationConfig> for SamplingParams {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            lastk: config.lastk,
            rag_usage: config.rag_usage,
            rag_threshold: config.rag_threshold,
            rag_k: config.rag_k,
        }
    }
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self::from(&GenerationConfig::default())
    }
}

/// One generation call
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system: String,
    pub query: String,
    /// Provider-side history bucket; one per conversation
    pub session_id: String,
    pub sampling: SamplingParams,
}

/// Prompt-to-text capability
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a system prompt and user query
    ///
    /// Implementations return trimmed text; an empty answer is
    /// [`GenerationError::Empty`], never `Ok("")`.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
