//! Concurrent runner execution.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use futures::FutureExt;
use swarmone_core::{RunnerSpec, SwarmError};
use swarmone_llm::TextGenerator;
use tracing::{info, warn};

use crate::scope::{bounded, ExecutionScope};

/// A configured runner paired with its client.
#[derive(Clone)]
pub struct Runner {
    pub spec: RunnerSpec,
    pub client: Arc<dyn TextGenerator>,
}

impl Runner {
    fn label(&self, index: usize) -> String {
        if self.spec.name.is_empty() {
            format!("runner {}", index)
        } else {
            format!("runner {} ({})", index, self.spec.name)
        }
    }
}

/// Per-runner outcomes, indexed by runner position.
///
/// Exactly one of `answers[i]` / `errors[i]` carries information: a failed
/// runner has an empty answer and a non-empty error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutResult {
    pub answers: Vec<String>,
    pub errors: Vec<String>,
}

/// Sends `instruction` to every runner at once and waits for all of them.
///
/// Each call is bounded by `runner_timeout` inside the scope's deadline. A
/// runner that errors, times out or panics only affects its own slot.
pub async fn fan_out(
    scope: &ExecutionScope,
    runners: &[Runner],
    instruction: &str,
    runner_timeout: Duration,
) -> FanOutResult {
    let budget = scope.child_budget(runner_timeout);

    let calls: Vec<_> = runners.iter().enumerate().map(|(index, runner)| async move {
        let label = runner.label(index);
        let start = Instant::now();
        let call = bounded(
            budget,
            &label,
            runner.client.generate(instruction, runner.spec.token_budget()),
        );
        let outcome = AssertUnwindSafe(call)
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(SwarmError::RunnerTask(panic_message(panic.as_ref()))));

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &outcome {
            Ok(resp) => info!(
                runner = %label,
                model = %runner.spec.model,
                elapsed_ms,
                chars = resp.content.len(),
                "runner answered"
            ),
            Err(e) => warn!(runner = %label, model = %runner.spec.model, elapsed_ms, error = %e, "runner failed"),
        }
        outcome
    }).collect();

    let mut result = FanOutResult {
        answers: Vec::with_capacity(runners.len()),
        errors: Vec::with_capacity(runners.len()),
    };
    for outcome in join_all(calls).await {
        match outcome {
            Ok(resp) => {
                result.answers.push(resp.content.trim().to_string());
                result.errors.push(String::new());
            }
            Err(e) => {
                result.answers.push(String::new());
                result.errors.push(e.to_string());
            }
        }
    }
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use swarmone_llm::LlmResponse;

    enum Script {
        Answer(&'static str),
        Fail,
        Sleep(u64),
        Panic,
    }

    struct Scripted(Script);

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<LlmResponse, SwarmError> {
            match self.0 {
                Script::Answer(text) => Ok(LlmResponse::text(text)),
                Script::Fail => Err(SwarmError::LlmError("connection reset".into())),
                Script::Sleep(secs) => {
                    tokio::time::sleep(Duration::from_secs(secs)).await;
                    Ok(LlmResponse::text("late"))
                }
                Script::Panic => panic!("provider exploded"),
            }
        }
    }

    fn runner(name: &str, script: Script) -> Runner {
        Runner {
            spec: RunnerSpec::new(name, "mock", "mock-model", 64),
            client: Arc::new(Scripted(script)),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failures_stay_in_their_own_slot() {
        let runners = vec![
            runner("a", Script::Answer("  four \n")),
            runner("b", Script::Fail),
            runner("", Script::Sleep(60)),
            runner("d", Script::Panic),
            runner("e", Script::Answer("4")),
        ];
        let result = fan_out(&ExecutionScope::unbounded(), &runners, "2+2?", Duration::from_secs(5)).await;

        assert_eq!(result.answers, vec!["four", "", "", "", "4"]);
        assert_eq!(result.errors[0], "");
        assert_eq!(result.errors[1], "LLM request failed: connection reset");
        assert_eq!(result.errors[2], "runner 2 timed out after 5s");
        assert_eq!(result.errors[3], "runner task failed: provider exploded");
        assert_eq!(result.errors[4], "");
    }

    #[tokio::test(start_paused = true)]
    async fn parent_deadline_caps_runner_timeout() {
        let scope = ExecutionScope::with_timeout(Duration::from_secs(2));
        let runners = vec![runner("slow", Script::Sleep(10))];
        let result = fan_out(&scope, &runners, "hi", Duration::ZERO).await;
        assert_eq!(result.errors[0], "runner 0 (slow) timed out after 2s");
    }

    #[tokio::test(start_paused = true)]
    async fn runners_run_concurrently() {
        let runners = vec![
            runner("a", Script::Sleep(3)),
            runner("b", Script::Sleep(3)),
            runner("c", Script::Sleep(3)),
        ];
        let start = tokio::time::Instant::now();
        let result = fan_out(&ExecutionScope::unbounded(), &runners, "hi", Duration::ZERO).await;
        assert_eq!(result.answers, vec!["late"; 3]);
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn whitespace_answer_is_kept_empty_without_error() {
        let runners = vec![runner("blank", Script::Answer(" \n\t "))];
        let result = fan_out(&ExecutionScope::unbounded(), &runners, "hi", Duration::ZERO).await;
        assert_eq!(result.answers, vec![""]);
        assert_eq!(result.errors, vec![""]);
    }
}
