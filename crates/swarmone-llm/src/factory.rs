//! Maps runner specs to provider clients.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use swarmone_config::ProviderSettings;
use swarmone_core::{RunnerSpec, SwarmError};
use tracing::debug;

use crate::anthropic::AnthropicClient;
use crate::client::{llm_err, TextGenerator};
use crate::gemini::GeminiClient;
use crate::openai::OpenAiClient;

/// Supported model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAI,
    Gemini,
    Anthropic,
}

impl FromStr for Provider {
    type Err = SwarmError;

    /// Case-insensitive; accepts `google`/`googleai` and `claude` as aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "gemini" | "google" | "googleai" => Ok(Self::Gemini),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            _ => Err(SwarmError::UnknownProvider(s.to_string())),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::OpenAI => "openai",
            Self::Gemini => "gemini",
            Self::Anthropic => "anthropic",
        };
        write!(f, "{}", s)
    }
}

/// Builds a generation client for a runner (or the judge).
///
/// The orchestrator only sees this trait, so tests can substitute scripted
/// clients without touching the network.
pub trait ClientFactory: Send + Sync {
    fn build(&self, spec: &RunnerSpec) -> Result<Arc<dyn TextGenerator>, SwarmError>;
}

/// Factory backed by the real provider APIs.
///
/// HTTP connection pools are created once per provider and shared by every
/// client built afterwards.
pub struct ProviderFactory {
    settings: ProviderSettings,
    openai_http: Client,
    gemini_http: Client,
    anthropic_http: Client,
}

impl ProviderFactory {
    pub fn new(settings: ProviderSettings) -> Result<Self, SwarmError> {
        let timeouts = settings.http_timeouts;
        Ok(Self {
            openai_http: http_client(timeouts.openai)?,
            gemini_http: http_client(timeouts.gemini)?,
            anthropic_http: http_client(timeouts.anthropic)?,
            settings,
        })
    }
}

fn http_client(timeout: Duration) -> Result<Client, SwarmError> {
    Client::builder().timeout(timeout).build().map_err(llm_err)
}

impl ClientFactory for ProviderFactory {
    fn build(&self, spec: &RunnerSpec) -> Result<Arc<dyn TextGenerator>, SwarmError> {
        let keys = &self.settings.keys;
        let provider = spec.provider.parse::<Provider>()?;
        debug!("Building {} client for {} ({})", provider, spec.model, spec.name);
        let client: Arc<dyn TextGenerator> = match provider {
            Provider::OpenAI => Arc::new(OpenAiClient::new(
                self.openai_http.clone(),
                &spec.model,
                &keys.openai,
                self.settings.openai_api_base.as_deref(),
            )),
            Provider::Gemini => Arc::new(GeminiClient::new(
                self.gemini_http.clone(),
                &spec.model,
                &keys.google,
            )),
            Provider::Anthropic => Arc::new(AnthropicClient::new(
                self.anthropic_http.clone(),
                &spec.model,
                &keys.anthropic,
            )),
        };
        Ok(client)
    }
}
