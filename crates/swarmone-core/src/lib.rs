//! Core domain types and error definitions for swarmone.
//!
//! This crate provides the types shared across the swarmone workspace:
//!
//! - [`SwarmError`] — Error type for orchestration and provider operations
//! - [`RunnerSpec`] and [`JudgeSpec`] — Ensemble participants
//! - [`Keys`] — Provider credentials
//! - [`RequestMeta`] — Scoring metadata returned with every answer
//!
//! # Example
//!
//! ```rust
//! use swarmone_core::{RequestMeta, RunnerSpec};
//!
//! let runner = RunnerSpec::new("runner-openai", "openai", "gpt-4o-mini", 512);
//! assert_eq!(runner.token_budget(), 512);
//!
//! let meta = RequestMeta::failed(3, vec![], vec![String::new(); 3], "c0ffee".into());
//! assert_eq!(meta.winner_index, -1);
//! assert_eq!(meta.scores, vec![0.0; 3]);
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while building clients, calling providers, or
/// arbitrating between runner answers.
#[derive(Error, Debug)]
pub enum SwarmError {
    /// The configuration declares no runners.
    #[error("no runners configured")]
    NoRunners,

    /// The judge provider or model is empty.
    #[error("judge provider/model not configured")]
    JudgeNotConfigured,

    /// Provider identifier not recognised by the client factory.
    #[error("unknown provider {0:?}")]
    UnknownProvider(String),

    /// A runner client could not be constructed.
    #[error("build client for runner {index} failed: {source}")]
    ClientBuild {
        index: usize,
        #[source]
        source: Box<SwarmError>,
    },

    /// Provider credentials are missing.
    #[error("{0} api key missing")]
    MissingApiKey(&'static str),

    /// LLM API request failed at the transport level.
    #[error("LLM request failed: {0}")]
    LlmError(String),

    /// Provider answered with a non-success status code.
    #[error("{provider} http {status}: {body}")]
    Http {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// Provider response body did not have the expected shape.
    #[error("{provider} decode error: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },

    /// Provider answered but produced no usable text.
    #[error("{provider} empty output{}", describe_reason(.reason))]
    EmptyOutput {
        provider: &'static str,
        reason: Option<String>,
    },

    /// Gemini refused the prompt.
    #[error("gemini safety block: {0}")]
    SafetyBlock(String),

    /// A runner or judge call exceeded its time budget.
    #[error("{what} timed out after {after:?}")]
    Timeout { what: String, after: Duration },

    /// A runner task panicked or was aborted before reporting.
    #[error("runner task failed: {0}")]
    RunnerTask(String),

    /// Every runner errored or returned blank text.
    #[error("all runners failed")]
    AllRunnersFailed,

    /// The judge returned only whitespace.
    #[error("judge returned empty content")]
    JudgeEmpty,

    /// The judge output could not be repaired into a verdict.
    #[error("judge unparsable: {0}")]
    JudgeUnparsable(String),

    /// Judge arbitration failed; wraps the underlying cause.
    #[error("judge error: {0}")]
    Judge(#[source] Box<SwarmError>),
}

fn describe_reason(reason: &Option<String>) -> String {
    reason.as_ref().map(|r| format!(" ({r})")).unwrap_or_default()
}

impl SwarmError {
    /// Wraps an error raised during judge arbitration.
    pub fn judge(inner: SwarmError) -> Self {
        match inner {
            already @ SwarmError::Judge(_) => already,
            other => SwarmError::Judge(Box::new(other)),
        }
    }

    /// Returns `true` for errors caused by configuration rather than runtime conditions.
    pub fn is_configuration(&self) -> bool {
        match self {
            SwarmError::NoRunners | SwarmError::JudgeNotConfigured | SwarmError::UnknownProvider(_) => true,
            SwarmError::ClientBuild { source, .. } | SwarmError::Judge(source) => source.is_configuration(),
            _ => false,
        }
    }
}

/// One participant in the ensemble.
///
/// The position of a runner in the configured list is its index for the
/// whole request: scores, errors and the winner are reported against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerSpec {
    /// Display name used in logs.
    #[serde(default)]
    pub name: String,
    /// Provider identifier (e.g. "openai", "gemini", "anthropic").
    pub provider: String,
    /// Provider-specific model identifier.
    pub model: String,
    /// Output token budget; zero or negative means provider default.
    #[serde(default)]
    pub max_tokens: i32,
}

impl RunnerSpec {
    pub fn new(
        name: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
        max_tokens: i32,
    ) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            model: model.into(),
            max_tokens,
        }
    }

    /// Token budget passed to the provider; 0 when unset.
    pub fn token_budget(&self) -> u32 {
        u32::try_from(self.max_tokens).unwrap_or(0)
    }
}

/// The arbitration model. Never counted as a runner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeSpec {
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub max_tokens: i32,
}

impl JudgeSpec {
    /// Returns `true` when both provider and model are set.
    pub fn is_configured(&self) -> bool {
        !self.provider.trim().is_empty() && !self.model.trim().is_empty()
    }

    /// Views the judge as a runner spec so it can go through the client factory.
    pub fn as_runner(&self) -> RunnerSpec {
        RunnerSpec::new("judge", &self.provider, &self.model, self.max_tokens)
    }
}

/// Provider API credentials.
#[derive(Clone, Default)]
pub struct Keys {
    pub openai: String,
    pub google: String,
    pub anthropic: String,
}

impl fmt::Debug for Keys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(key: &str) -> &'static str {
            if key.is_empty() {
                "<unset>"
            } else {
                "<redacted>"
            }
        }
        f.debug_struct("Keys")
            .field("openai", &mask(&self.openai))
            .field("google", &mask(&self.google))
            .field("anthropic", &mask(&self.anthropic))
            .finish()
    }
}

/// Scoring metadata returned alongside the winning answer.
///
/// `scores` and `runner_errors` always have one entry per configured
/// runner. `winner_index` is -1 when no winner could be chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMeta {
    /// Runner index of the winning answer, or -1.
    pub winner_index: i64,
    /// Number of configured runners.
    #[serde(rename = "runners")]
    pub runner_count: usize,
    /// Judge score per runner, 0 for runners that produced no candidate.
    pub scores: Vec<f64>,
    /// Runner indices whose answer was non-empty, ascending.
    pub included_indices: Vec<usize>,
    /// Opaque per-request correlation token.
    pub consensus_id: String,
    /// Error message per runner; empty string means success.
    pub runner_errors: Vec<String>,
}

impl RequestMeta {
    /// Metadata for a request that produced no winner.
    pub fn failed(
        runner_count: usize,
        included_indices: Vec<usize>,
        runner_errors: Vec<String>,
        consensus_id: String,
    ) -> Self {
        Self {
            winner_index: -1,
            runner_count,
            scores: vec![0.0; runner_count],
            included_indices,
            consensus_id,
            runner_errors,
        }
    }
}
