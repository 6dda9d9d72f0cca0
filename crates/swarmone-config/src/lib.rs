//! Runtime configuration for swarmone.
//!
//! - [`SwarmConfig`] — Runners, judge and timeouts used by the orchestrator
//! - [`SwarmConfigBuilder`] — Fluent API for building configurations programmatically
//! - [`ProviderSettings`] — Credentials and HTTP options for the provider clients
//! - [`ConfigError`] — Loading and validation failures
//!
//! Configuration is read once at start-up and passed explicitly to every
//! request; nothing here is global.
//!
//! # Loading from the environment
//!
//! ```rust,ignore
//! use swarmone_config::{ProviderSettings, SwarmConfig};
//!
//! let config = SwarmConfig::from_env();
//! let providers = ProviderSettings::from_env();
//! ```
//!
//! # Builder API
//!
//! ```rust
//! use std::time::Duration;
//! use swarmone_config::SwarmConfig;
//!
//! let config = SwarmConfig::builder()
//!     .runner("fast", "openai", "gpt-4o-mini", 256)
//!     .runner("careful", "anthropic", "claude-3-5-haiku-20241022", 512)
//!     .judge("anthropic", "claude-3-5-sonnet-20241022", 384)
//!     .runner_timeout(Duration::from_secs(10))
//!     .build();
//!
//! assert_eq!(config.runners.len(), 2);
//! assert!(config.validate().is_ok());
//! ```

mod duration;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use swarmone_core::{JudgeSpec, Keys, RunnerSpec};
use tracing::warn;

pub use duration::parse_duration;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(25);
const DEFAULT_RUNNER_TIMEOUT: Duration = Duration::from_secs(12);
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(18);
const DEFAULT_JUDGE_PROVIDER: &str = "anthropic";
const DEFAULT_JUDGE_MODEL: &str = "claude-3-5-sonnet-20241022";
const DEFAULT_JUDGE_MAX_TOKENS: i32 = 384;

/// Errors that can occur when loading or validating configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Failed to parse a JSON runner list.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configuration is structurally invalid.
    #[error("Invalid config: {0}")]
    Validation(String),
}

/// HTTP server options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:8080`.
    pub addr: String,
    /// Overall budget for one `/v1/ask` request; zero disables it.
    pub request_timeout: Duration,
    /// Budget for a single runner call; zero means the request deadline only.
    pub runner_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            runner_timeout: DEFAULT_RUNNER_TIMEOUT,
        }
    }
}

/// Arbitration settings. Judge-only consensus is the single supported strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    pub judge: JudgeSpec,
}

/// Complete orchestrator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwarmConfig {
    pub server: ServerConfig,
    /// Runners in index order.
    pub runners: Vec<RunnerSpec>,
    pub consensus: ConsensusConfig,
}

impl SwarmConfig {
    /// Creates a builder with no runners, no judge and no timeouts.
    pub fn builder() -> SwarmConfigBuilder {
        SwarmConfigBuilder::new()
    }

    /// Loads the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    ///
    /// Unset or unparsable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let addr = get("SERVER_ADDR")
            .map(|a| normalize_addr(&a))
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let request_timeout = duration_or(get("REQUEST_TIMEOUT"), DEFAULT_REQUEST_TIMEOUT);
        let runner_timeout = duration_or(get("RUNNER_TIMEOUT"), DEFAULT_RUNNER_TIMEOUT);

        let runners = match get("SWARMONE_RUNNERS").map(|raw| parse_runners(&raw)) {
            Some(Ok(runners)) if !runners.is_empty() => runners,
            Some(Ok(_)) => {
                warn!("SWARMONE_RUNNERS is an empty list, using default runners");
                default_runners()
            }
            Some(Err(e)) => {
                warn!("Ignoring malformed SWARMONE_RUNNERS ({}), using default runners", e);
                default_runners()
            }
            None => default_runners(),
        };

        let judge = JudgeSpec {
            provider: get("JUDGE_PROVIDER").unwrap_or_else(|| DEFAULT_JUDGE_PROVIDER.to_string()),
            model: get("JUDGE_MODEL").unwrap_or_else(|| DEFAULT_JUDGE_MODEL.to_string()),
            max_tokens: get("JUDGE_MAX_TOKENS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_JUDGE_MAX_TOKENS),
        };

        Self {
            server: ServerConfig {
                addr,
                request_timeout,
                runner_timeout,
            },
            runners,
            consensus: ConsensusConfig { judge },
        }
    }

    /// Checks that the configuration can serve requests.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runners.is_empty() {
            return Err(ConfigError::Validation("no runners configured".into()));
        }
        if let Some((i, _)) = self
            .runners
            .iter()
            .enumerate()
            .find(|(_, r)| r.provider.trim().is_empty() || r.model.trim().is_empty())
        {
            return Err(ConfigError::Validation(format!(
                "runner {} is missing provider or model",
                i
            )));
        }
        Ok(())
    }
}

/// Parses a JSON array of runner specs.
pub fn parse_runners(json: &str) -> Result<Vec<RunnerSpec>, ConfigError> {
    Ok(serde_json::from_str(json)?)
}

/// The ensemble used when `SWARMONE_RUNNERS` is not provided.
pub fn default_runners() -> Vec<RunnerSpec> {
    vec![
        RunnerSpec::new("runner-openai", "openai", "gpt-5-nano-2025-08-07", 512),
        RunnerSpec::new("runner-gemini", "gemini", "gemini-2.5-flash", 512),
        RunnerSpec::new("runner-claude", "anthropic", "claude-3-5-haiku-20241022", 512),
    ]
}

fn duration_or(value: Option<String>, default: Duration) -> Duration {
    match value {
        Some(raw) => parse_duration(&raw).unwrap_or_else(|| {
            warn!("Ignoring unparsable duration {:?}, using {:?}", raw, default);
            default
        }),
        None => default,
    }
}

/// Accepts Go-style `:8080` by binding all interfaces.
fn normalize_addr(addr: &str) -> String {
    let addr = addr.trim();
    match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{}", port),
        None => addr.to_string(),
    }
}

/// Per-provider HTTP client timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub openai: Duration,
    pub gemini: Duration,
    pub anthropic: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            openai: DEFAULT_HTTP_TIMEOUT,
            gemini: DEFAULT_HTTP_TIMEOUT,
            anthropic: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

/// Credentials and transport options consumed by the client factory.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub keys: Keys,
    /// Alternative OpenAI-compatible endpoint.
    pub openai_api_base: Option<String>,
    pub http_timeouts: HttpTimeouts,
}

impl ProviderSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            keys: Keys {
                openai: get("OPENAI_API_KEY").unwrap_or_default(),
                google: get("GOOGLE_API_KEY").unwrap_or_default(),
                anthropic: get("ANTHROPIC_API_KEY").unwrap_or_default(),
            },
            openai_api_base: get("OPENAI_API_BASE"),
            http_timeouts: HttpTimeouts {
                openai: duration_or(get("OPENAI_HTTP_TIMEOUT"), DEFAULT_HTTP_TIMEOUT),
                gemini: duration_or(get("GEMINI_HTTP_TIMEOUT"), DEFAULT_HTTP_TIMEOUT),
                anthropic: duration_or(get("ANTHROPIC_HTTP_TIMEOUT"), DEFAULT_HTTP_TIMEOUT),
            },
        }
    }
}

// ============================================================================
// Builder API
// ============================================================================

/// Builder for constructing [`SwarmConfig`] programmatically.
///
/// Starts empty: no runners, an unconfigured judge, and zero (disabled)
/// timeouts.
#[derive(Debug)]
pub struct SwarmConfigBuilder {
    server: ServerConfig,
    runners: Vec<RunnerSpec>,
    judge: JudgeSpec,
}

impl SwarmConfigBuilder {
    fn new() -> Self {
        Self {
            server: ServerConfig {
                addr: DEFAULT_ADDR.to_string(),
                request_timeout: Duration::ZERO,
                runner_timeout: Duration::ZERO,
            },
            runners: Vec::new(),
            judge: JudgeSpec::default(),
        }
    }

    /// Appends a runner; index order follows call order.
    pub fn runner(
        mut self,
        name: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
        max_tokens: i32,
    ) -> Self {
        self.runners.push(RunnerSpec::new(name, provider, model, max_tokens));
        self
    }

    /// Replaces the runner list.
    pub fn runners(mut self, runners: impl IntoIterator<Item = RunnerSpec>) -> Self {
        self.runners = runners.into_iter().collect();
        self
    }

    pub fn judge(mut self, provider: impl Into<String>, model: impl Into<String>, max_tokens: i32) -> Self {
        self.judge = JudgeSpec {
            provider: provider.into(),
            model: model.into(),
            max_tokens,
        };
        self
    }

    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.server.addr = normalize_addr(&addr.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.server.request_timeout = timeout;
        self
    }

    pub fn runner_timeout(mut self, timeout: Duration) -> Self {
        self.server.runner_timeout = timeout;
        self
    }

    pub fn build(self) -> SwarmConfig {
        SwarmConfig {
            server: self.server,
            runners: self.runners,
            consensus: ConsensusConfig { judge: self.judge },
        }
    }
}
