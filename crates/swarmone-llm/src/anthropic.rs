//! Anthropic Claude Messages API client.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use swarmone_core::SwarmError;
use tracing::info;

use crate::client::{join_text, llm_err, LlmMetrics, LlmResponse, TextGenerator};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 256;

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize, Default)]
struct Usage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Usage,
    #[serde(default)]
    stop_reason: Option<String>,
}

/// Client for Anthropic's Claude API.
pub struct AnthropicClient {
    client: Client,
    model: String,
    api_key: String,
}

impl AnthropicClient {
    /// Creates a client sharing the given HTTP connection pool.
    pub fn new(client: Client, model: &str, api_key: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for AnthropicClient {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<LlmResponse, SwarmError> {
        if self.api_key.is_empty() {
            return Err(SwarmError::MissingApiKey("anthropic"));
        }
        let start = Instant::now();

        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: if max_tokens == 0 { DEFAULT_MAX_TOKENS } else { max_tokens },
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(llm_err)?;

        let status = response.status();
        let body = response.text().await.map_err(llm_err)?;
        if !status.is_success() {
            return Err(SwarmError::Http {
                provider: "anthropic",
                status: status.as_u16(),
                body,
            });
        }

        let mut result = parse_response(&body)?;
        result.metrics.elapsed_ms = start.elapsed().as_millis() as u64;

        info!(
            "Anthropic {}: {}ms, tokens: {}/{} (in/out)",
            self.model, result.metrics.elapsed_ms, result.metrics.input_tokens, result.metrics.output_tokens
        );
        Ok(result)
    }
}

/// Concatenates the text blocks of a Messages API response body.
fn parse_response(body: &str) -> Result<LlmResponse, SwarmError> {
    let resp: MessagesResponse = serde_json::from_str(body).map_err(|e| SwarmError::Decode {
        provider: "anthropic",
        message: format!("{}; body={}", e, body),
    })?;

    let content = join_text(
        resp.content
            .iter()
            .filter(|b| b.block_type.eq_ignore_ascii_case("text"))
            .filter_map(|b| b.text.as_deref()),
    );
    if content.is_empty() {
        return Err(SwarmError::EmptyOutput {
            provider: "anthropic",
            reason: resp.stop_reason.map(|r| format!("stop_reason={}", r)),
        });
    }

    Ok(LlmResponse {
        content,
        metrics: LlmMetrics {
            input_tokens: resp.usage.input_tokens.unwrap_or(0),
            output_tokens: resp.usage.output_tokens.unwrap_or(0),
            elapsed_ms: 0,
        },
    })
}
