//! LLMProxy HTTP client
//!
//! The proxy accepts a flat JSON request (model, system prompt, query,
//! sampling knobs, session id) authenticated with an `x-api-key` header and
//! answers `{"response": "..."}`. Conversation history is kept server-side,
//! keyed by `session_id`, for the last `lastk` exchanges.

use super::{GenerationError, GenerationRequest, TextGenerator};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("melody-chat/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct ProxyRequest<'a> {
    model: &'a str,
    system: &'a str,
    query: &'a str,
    temperature: f32,
    lastk: u32,
    session_id: &'a str,
    rag_usage: bool,
    rag_threshold: f32,
    rag_k: u32,
}

#[derive(Debug, Deserialize)]
struct ProxyResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Generation client for an LLMProxy endpoint
pub struct LlmProxyClient {
    http_client: Client,
    endpoint: String,
    api_key: String,
}

impl LlmProxyClient {
    pub fn new(
        endpoint: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl TextGenerator for LlmProxyClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = ProxyRequest {
            model: &request.sampling.model,
            system: &request.system,
            query: &request.query,
            temperature: request.sampling.temperature,
            lastk: request.sampling.lastk,
            session_id: &request.session_id,
            rag_usage: request.sampling.rag_usage,
            rag_threshold: request.sampling.rag_threshold,
            rag_k: request.sampling.rag_k,
        };

        debug!(
            session_id = %request.session_id,
            model = %request.sampling.model,
            "Sending generation request"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status(status.as_u16(), error_text));
        }

        let parsed: ProxyResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;

        let text = parsed.response.unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return Err(GenerationError::Empty);
        }

        debug!(chars = text.len(), "Generation complete");
        Ok(text)
    }
}
