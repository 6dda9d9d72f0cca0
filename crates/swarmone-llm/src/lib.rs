//! Provider clients for swarmone.
//!
//! Every provider sits behind the same one-method capability:
//!
//! - [`TextGenerator`] — "generate text from a prompt within a token budget"
//! - [`OpenAiClient`] — OpenAI chat completions (also any compatible endpoint)
//! - [`GeminiClient`] — Google Gemini `generateContent`
//! - [`AnthropicClient`] — Claude models via the Messages API
//! - [`ClientFactory`] / [`ProviderFactory`] — map a [`RunnerSpec`] to a client
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use swarmone_config::ProviderSettings;
//! use swarmone_core::RunnerSpec;
//! use swarmone_llm::{ClientFactory, ProviderFactory};
//!
//! let factory = ProviderFactory::new(ProviderSettings::from_env())?;
//! let spec = RunnerSpec::new("fast", "claude", "claude-3-5-haiku-20241022", 256);
//! let client = factory.build(&spec)?;
//! let response = client.generate("Name three prime numbers.", spec.token_budget()).await?;
//! println!("{} ({} ms)", response.content, response.metrics.elapsed_ms);
//! ```
//!
//! Deadlines are not part of the trait: callers bound a call with
//! `tokio::time::timeout` and dropping the future cancels the request.
//!
//! [`RunnerSpec`]: swarmone_core::RunnerSpec

mod anthropic;
mod client;
mod factory;
mod gemini;
mod openai;

pub use anthropic::AnthropicClient;
pub use client::{LlmMetrics, LlmResponse, TextGenerator};
pub use factory::{ClientFactory, Provider, ProviderFactory};
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
