//! The provider-neutral generation capability.

use async_trait::async_trait;
use swarmone_core::SwarmError;

/// Token usage and timing metrics from an LLM call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LlmMetrics {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub elapsed_ms: u64,
}

/// Complete response from an LLM call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResponse {
    /// Trimmed, non-empty generated text.
    pub content: String,
    pub metrics: LlmMetrics,
}

impl LlmResponse {
    /// Response without usage information, mostly for tests and mocks.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metrics: LlmMetrics::default(),
        }
    }
}

/// Generates text from a single user prompt.
///
/// `max_tokens == 0` leaves the output budget to the provider's default.
/// Implementations return an error rather than an empty `content`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<LlmResponse, SwarmError>;
}

/// Converts any error into a `SwarmError::LlmError`.
pub(crate) fn llm_err(e: impl ToString) -> SwarmError {
    SwarmError::LlmError(e.to_string())
}

/// Trims each fragment, drops blank ones, and joins the rest with newlines.
pub(crate) fn join_text<'a>(fragments: impl IntoIterator<Item = &'a str>) -> String {
    fragments
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_text_skips_blank_fragments() {
        assert_eq!(join_text(["  a ", "", "\n", "b"]), "a\nb");
        assert_eq!(join_text(Vec::<&str>::new()), "");
    }
}
