//! OpenAI-compatible chat completion client.
//!
//! Works with the OpenAI API and any compatible endpoint configured through
//! an API base URL.

use std::time::Instant;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
    Client,
};
use async_trait::async_trait;
use swarmone_core::SwarmError;
use tracing::info;

use crate::client::{llm_err, LlmMetrics, LlmResponse, TextGenerator};

/// Client for OpenAI-compatible chat completion APIs.
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    has_credentials: bool,
}

impl OpenAiClient {
    /// Creates a client for the given model.
    ///
    /// With a custom `api_base` the key may be empty (local endpoints).
    pub fn new(http: reqwest::Client, model: &str, api_key: &str, api_base: Option<&str>) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = api_base {
            config = config.with_api_base(base);
        }

        Self {
            client: Client::with_config(config).with_http_client(http),
            model: model.to_string(),
            has_credentials: !api_key.is_empty() || api_base.is_some(),
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<LlmResponse, SwarmError> {
        if !self.has_credentials {
            return Err(SwarmError::MissingApiKey("openai"));
        }
        let start = Instant::now();

        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(llm_err)?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(vec![ChatCompletionRequestMessage::User(message)]);
        if max_tokens > 0 {
            builder.max_completion_tokens(max_tokens);
        }
        let request = builder.build().map_err(llm_err)?;

        let response = self.client.chat().create(request).await.map_err(llm_err)?;
        let result = extract_response(response, start.elapsed().as_millis() as u64)?;

        info!(
            "OpenAI {}: {}ms, tokens: {}/{} (in/out)",
            self.model, result.metrics.elapsed_ms, result.metrics.input_tokens, result.metrics.output_tokens
        );
        Ok(result)
    }
}

/// Extracts content and metrics from a completion response.
fn extract_response(response: CreateChatCompletionResponse, elapsed_ms: u64) -> Result<LlmResponse, SwarmError> {
    let (input_tokens, output_tokens) = response
        .usage
        .as_ref()
        .map(|u| (u.prompt_tokens, u.completion_tokens))
        .unwrap_or((0, 0));

    let (content, finish_reason) = response
        .choices
        .into_iter()
        .next()
        .map(|c| (c.message.content, c.finish_reason.map(|r| format!("{:?}", r))))
        .unwrap_or((None, None));

    let content = non_empty_content(content.as_deref(), finish_reason)?;

    Ok(LlmResponse {
        content,
        metrics: LlmMetrics {
            input_tokens,
            output_tokens,
            elapsed_ms,
        },
    })
}

/// Trims the first choice's text, reporting the finish reason when there is none.
fn non_empty_content(content: Option<&str>, finish_reason: Option<String>) -> Result<String, SwarmError> {
    match content.map(str::trim).filter(|c| !c.is_empty()) {
        Some(text) => Ok(text.to_string()),
        None => Err(SwarmError::EmptyOutput {
            provider: "openai",
            reason: Some(format!(
                "finish_reason={}",
                finish_reason.unwrap_or_else(|| "none".to_string())
            )),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_trimmed() {
        assert_eq!(non_empty_content(Some("  42\n"), None).unwrap(), "42");
    }

    #[test]
    fn missing_content_names_finish_reason() {
        let err = non_empty_content(None, Some("Length".into())).unwrap_err();
        assert_eq!(err.to_string(), "openai empty output (finish_reason=Length)");

        let err = non_empty_content(Some("   "), None).unwrap_err();
        assert_eq!(err.to_string(), "openai empty output (finish_reason=none)");
    }

    #[tokio::test]
    async fn missing_key_fails_without_custom_base() {
        let client = OpenAiClient::new(reqwest::Client::new(), "gpt-4o-mini", "", None);
        let err = client.generate("hi", 16).await.unwrap_err();
        assert!(matches!(err, SwarmError::MissingApiKey("openai")));
    }
}
