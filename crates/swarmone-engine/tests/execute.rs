//! End-to-end tests for `execute` with scripted runners and judge.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use swarmone_config::SwarmConfig;
use swarmone_core::{RunnerSpec, SwarmError};
use swarmone_engine::{execute, ExecutionScope};
use swarmone_llm::{ClientFactory, LlmResponse, TextGenerator};

// ---------------------------------------------------------------------------
// Mocks
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Reply {
    Text(&'static str),
    Error(&'static str),
    After(u64, &'static str),
}

/// Replies the same way every call and records the prompts it saw.
struct ScriptedClient {
    reply: Reply,
    prompts: Mutex<Vec<(String, u32)>>,
}

impl ScriptedClient {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<(String, u32)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedClient {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<LlmResponse, SwarmError> {
        self.prompts.lock().unwrap().push((prompt.to_string(), max_tokens));
        match self.reply.clone() {
            Reply::Text(text) => Ok(LlmResponse::text(text)),
            Reply::Error(msg) => Err(SwarmError::LlmError(msg.to_string())),
            Reply::After(secs, text) => {
                tokio::time::sleep(Duration::from_secs(secs)).await;
                Ok(LlmResponse::text(text))
            }
        }
    }
}

/// Resolves clients by model name.
#[derive(Default)]
struct ScriptedFactory {
    clients: HashMap<String, Arc<ScriptedClient>>,
}

impl ScriptedFactory {
    fn with(mut self, model: &str, client: Arc<ScriptedClient>) -> Self {
        self.clients.insert(model.to_string(), client);
        self
    }
}

impl ClientFactory for ScriptedFactory {
    fn build(&self, spec: &RunnerSpec) -> Result<Arc<dyn TextGenerator>, SwarmError> {
        self.clients
            .get(&spec.model)
            .map(|c| c.clone() as Arc<dyn TextGenerator>)
            .ok_or_else(|| SwarmError::UnknownProvider(spec.provider.clone()))
    }
}

fn config(models: &[&str]) -> SwarmConfig {
    models
        .iter()
        .enumerate()
        .fold(SwarmConfig::builder(), |b, (i, m)| b.runner(format!("r{i}"), "mock", *m, 128))
        .judge("mock", "judge", 0)
        .runner_timeout(Duration::from_secs(5))
        .build()
}

/// Three runners `m0..m2` with the given replies plus a judge.
fn scripted(replies: [Reply; 3], judge: Arc<ScriptedClient>) -> ScriptedFactory {
    let [a, b, c] = replies;
    ScriptedFactory::default()
        .with("m0", ScriptedClient::new(a))
        .with("m1", ScriptedClient::new(b))
        .with("m2", ScriptedClient::new(c))
        .with("judge", judge)
}

const MODELS: [&str; 3] = ["m0", "m1", "m2"];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn strict_verdict_maps_candidate_winner_to_runner_index() {
    let judge = ScriptedClient::new(Reply::Text(r#"{"scores":[0.9,0.2],"winner":0}"#));
    let factory = scripted(
        [Reply::Error("503"), Reply::Text(" Paris "), Reply::Text("Lyon")],
        judge.clone(),
    );

    let consensus = execute(&ExecutionScope::unbounded(), &config(&MODELS), &factory, "Capital of France?")
        .await
        .unwrap();

    assert_eq!(consensus.answer, "Paris");
    assert_eq!(consensus.meta.winner_index, 1);
    assert_eq!(consensus.meta.runner_count, 3);
    assert_eq!(consensus.meta.scores, vec![0.0, 0.9, 0.2]);
    assert_eq!(consensus.meta.included_indices, vec![1, 2]);
    assert_eq!(consensus.meta.runner_errors[0], "LLM request failed: 503");
    assert_eq!(consensus.meta.runner_errors[1], "");

    let prompts = judge.prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].1, 256, "judge budget falls back when unset");
    assert!(prompts[0].0.contains(r#"{"index":0,"text":"Paris"}"#));
}

#[tokio::test]
async fn malformed_verdict_is_repaired() {
    let judge = ScriptedClient::new(Reply::Text("Result: scores 0.7, 0.3; winner=1"));
    let factory = scripted(
        [Reply::Text("A"), Reply::Text(""), Reply::Text("B")],
        judge,
    );

    let consensus = execute(&ExecutionScope::unbounded(), &config(&MODELS), &factory, "pick")
        .await
        .unwrap();

    assert_eq!(consensus.meta.winner_index, 2);
    assert_eq!(consensus.answer, "B");
    assert_eq!(consensus.meta.scores, vec![0.7, 0.0, 0.3]);
}

#[tokio::test]
async fn out_of_range_winner_uses_lowest_argmax() {
    let judge = ScriptedClient::new(Reply::Text(r#"{"scores":[0.4,0.8,0.8],"winner":7}"#));
    let factory = scripted([Reply::Text("a"), Reply::Text("b"), Reply::Text("c")], judge);

    let consensus = execute(&ExecutionScope::unbounded(), &config(&MODELS), &factory, "pick")
        .await
        .unwrap();

    assert_eq!(consensus.meta.winner_index, 1);
    assert_eq!(consensus.answer, "b");
}

#[tokio::test]
async fn all_runners_failing_is_a_terminal_outcome() {
    let judge = ScriptedClient::new(Reply::Text(r#"{"scores":[1],"winner":0}"#));
    let factory = scripted(
        [Reply::Error("boom"), Reply::Text("   "), Reply::Error("quota")],
        judge.clone(),
    );

    let err = execute(&ExecutionScope::unbounded(), &config(&MODELS), &factory, "hi")
        .await
        .unwrap_err();

    assert!(matches!(err.source, SwarmError::AllRunnersFailed));
    assert_eq!(err.to_string(), "all runners failed");
    assert_eq!(err.meta.winner_index, -1);
    assert_eq!(err.meta.scores, vec![0.0; 3]);
    assert!(err.meta.included_indices.is_empty());
    assert_eq!(err.meta.runner_errors[1], "");
    assert_eq!(err.meta.runner_errors[2], "LLM request failed: quota");
    assert!(!err.meta.consensus_id.is_empty());
    assert!(judge.prompts().is_empty(), "judge is not consulted");
}

#[tokio::test]
async fn judge_failure_keeps_fan_out_diagnostics() {
    let judge = ScriptedClient::new(Reply::Error("overloaded"));
    let factory = scripted([Reply::Text("a"), Reply::Error("x"), Reply::Text("c")], judge);

    let err = execute(&ExecutionScope::unbounded(), &config(&MODELS), &factory, "hi")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "judge error: LLM request failed: overloaded");
    assert_eq!(err.meta.winner_index, -1);
    assert_eq!(err.meta.scores, vec![0.0; 3]);
    assert_eq!(err.meta.included_indices, vec![0, 2]);
    assert_eq!(err.meta.runner_errors[1], "LLM request failed: x");
}

#[tokio::test]
async fn blank_or_unparsable_judge_output_fails() {
    let judge = ScriptedClient::new(Reply::Text("  \n "));
    let factory = scripted([Reply::Text("a"), Reply::Text("b"), Reply::Text("c")], judge);
    let err = execute(&ExecutionScope::unbounded(), &config(&MODELS), &factory, "hi")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "judge error: judge returned empty content");

    let judge = ScriptedClient::new(Reply::Text("I like the second one best."));
    let factory = scripted([Reply::Text("a"), Reply::Text("b"), Reply::Text("c")], judge);
    let err = execute(&ExecutionScope::unbounded(), &config(&MODELS), &factory, "hi")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "judge error: judge unparsable: I like the second one best.");
    assert_eq!(err.meta.included_indices, vec![0, 1, 2]);
}

#[tokio::test]
async fn unconfigured_judge_is_rejected() {
    let judge = ScriptedClient::new(Reply::Text("{}"));
    let factory = scripted([Reply::Text("a"), Reply::Text("b"), Reply::Text("c")], judge);
    let mut config = config(&MODELS);
    config.consensus.judge.model.clear();

    let err = execute(&ExecutionScope::unbounded(), &config, &factory, "hi")
        .await
        .unwrap_err();
    assert!(err.source.is_configuration());
    assert_eq!(err.to_string(), "judge error: judge provider/model not configured");
    assert_eq!(err.meta.runner_errors.len(), 3);
}

#[tokio::test]
async fn configuration_errors_still_carry_metadata() {
    let factory = ScriptedFactory::default();

    let empty = SwarmConfig::builder().judge("mock", "judge", 0).build();
    let err = execute(&ExecutionScope::unbounded(), &empty, &factory, "hi")
        .await
        .unwrap_err();
    assert!(matches!(err.source, SwarmError::NoRunners));
    assert_eq!(err.meta.runner_count, 0);

    let err = execute(&ExecutionScope::unbounded(), &config(&["nope", "nada"]), &factory, "hi")
        .await
        .unwrap_err();
    assert!(matches!(err.source, SwarmError::ClientBuild { index: 0, .. }));
    assert!(err.source.is_configuration());
    assert_eq!(err.meta.scores, vec![0.0; 2]);
    assert_eq!(err.meta.runner_errors, vec![String::new(); 2]);
    assert_eq!(err.meta.winner_index, -1);
}

#[tokio::test(start_paused = true)]
async fn slow_runner_times_out_without_blocking_others() {
    let judge = ScriptedClient::new(Reply::Text(r#"{"scores":[0.6,0.5],"winner":0}"#));
    let factory = scripted(
        [Reply::Text("fast"), Reply::After(60, "slow"), Reply::After(1, "steady")],
        judge,
    );

    let consensus = execute(&ExecutionScope::unbounded(), &config(&MODELS), &factory, "hi")
        .await
        .unwrap();

    assert_eq!(consensus.meta.included_indices, vec![0, 2]);
    assert_eq!(consensus.meta.runner_errors[1], "runner 1 (r1) timed out after 5s");
    assert_eq!(consensus.meta.scores, vec![0.6, 0.0, 0.5]);
    assert_eq!(consensus.answer, "fast");
}

#[tokio::test(start_paused = true)]
async fn judge_never_outlives_the_request_deadline() {
    let judge = ScriptedClient::new(Reply::After(8, r#"{"scores":[1],"winner":0}"#));
    let factory = scripted(
        [Reply::After(2, "a"), Reply::Error("x"), Reply::Error("y")],
        judge,
    );

    let scope = ExecutionScope::with_timeout(Duration::from_secs(6));
    let err = execute(&scope, &config(&MODELS), &factory, "hi").await.unwrap_err();

    assert!(err.to_string().starts_with("judge error: judge timed out"), "{err}");
    assert_eq!(err.meta.included_indices, vec![0]);
}

#[tokio::test]
async fn identical_inputs_give_identical_results_with_fresh_ids() {
    let judge = ScriptedClient::new(Reply::Text(r#"{"scores":[0.31, 0.77, 0.5],"winner":1}"#));
    let factory = scripted([Reply::Text("a"), Reply::Text("b"), Reply::Text("c")], judge);
    let config = config(&MODELS);

    let first = execute(&ExecutionScope::unbounded(), &config, &factory, "same").await.unwrap();
    let second = execute(&ExecutionScope::unbounded(), &config, &factory, "same").await.unwrap();

    assert_eq!(first.meta.winner_index, second.meta.winner_index);
    assert_eq!(first.meta.scores, second.meta.scores);
    assert_eq!(first.answer, second.answer);
    assert_ne!(first.meta.consensus_id, second.meta.consensus_id);
}

#[tokio::test]
async fn included_indices_match_successful_non_empty_answers() {
    let judge = ScriptedClient::new(Reply::Text(r#"{"scores":[0.5],"winner":0}"#));
    let factory = scripted([Reply::Text(" "), Reply::Error("e"), Reply::Text("ok")], judge);

    let consensus = execute(&ExecutionScope::unbounded(), &config(&MODELS), &factory, "hi")
        .await
        .unwrap();

    let meta = consensus.meta;
    assert_eq!(meta.scores.len(), 3);
    assert_eq!(meta.runner_errors.len(), 3);
    assert_eq!(meta.included_indices, vec![2]);
    assert!(meta.included_indices.contains(&(meta.winner_index as usize)));
}
