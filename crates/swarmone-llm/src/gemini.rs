//! Google Gemini `generateContent` client.
//!
//! A prompt refused by safety filters comes back as `promptFeedback.blockReason`
//! with no candidates; that is surfaced as [`SwarmError::SafetyBlock`] instead
//! of an empty answer.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use swarmone_core::SwarmError;
use tracing::info;

use crate::client::{join_text, llm_err, LlmMetrics, LlmResponse, TextGenerator};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: UsageMetadata,
}

/// Client for Google's Gemini REST API.
pub struct GeminiClient {
    client: Client,
    model: String,
    api_key: String,
}

impl GeminiClient {
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
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<LlmResponse, SwarmError> {
        if self.api_key.is_empty() {
            return Err(SwarmError::MissingApiKey("gemini"));
        }
        let start = Instant::now();

        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: (max_tokens > 0).then_some(GenerationConfig {
                max_output_tokens: max_tokens,
            }),
        };

        let url = format!("{}/models/{}:generateContent", GEMINI_API_BASE, self.model);
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(llm_err)?;

        let status = response.status();
        let body = response.text().await.map_err(llm_err)?;
        if !status.is_success() {
            return Err(SwarmError::Http {
                provider: "gemini",
                status: status.as_u16(),
                body,
            });
        }

        let mut result = parse_response(&body)?;
        result.metrics.elapsed_ms = start.elapsed().as_millis() as u64;

        info!(
            "Gemini {}: {}ms, tokens: {}/{} (in/out)",
            self.model, result.metrics.elapsed_ms, result.metrics.input_tokens, result.metrics.output_tokens
        );
        Ok(result)
    }
}

/// Extracts the text of every candidate part from a response body.
fn parse_response(body: &str) -> Result<LlmResponse, SwarmError> {
    let resp: GenerateContentResponse = serde_json::from_str(body).map_err(|e| SwarmError::Decode {
        provider: "gemini",
        message: format!("{}; body={}", e, body),
    })?;

    if let Some(reason) = resp
        .prompt_feedback
        .and_then(|pf| pf.block_reason)
        .filter(|r| !r.is_empty())
    {
        return Err(SwarmError::SafetyBlock(reason));
    }

    let content = join_text(
        resp.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref()),
    );
    if content.is_empty() {
        let reasons: Vec<&str> = resp
            .candidates
            .iter()
            .filter_map(|c| c.finish_reason.as_deref())
            .collect();
        return Err(SwarmError::EmptyOutput {
            provider: "gemini",
            reason: (!reasons.is_empty()).then(|| format!("finish_reasons={:?}", reasons)),
        });
    }

    Ok(LlmResponse {
        content,
        metrics: LlmMetrics {
            input_tokens: resp.usage_metadata.prompt_token_count.unwrap_or(0),
            output_tokens: resp.usage_metadata.candidates_token_count.unwrap_or(0),
            elapsed_ms: 0,
        },
    })
}
