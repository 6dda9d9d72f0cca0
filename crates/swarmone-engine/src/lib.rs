//! Ensemble execution engine for swarmone.
//!
//! - [`execute`] — Runs one instruction through every runner and the judge
//! - [`ExecutionScope`] — Deadline shared by all calls of a request
//! - [`Consensus`] / [`ExecuteError`] — Outcome, always with [`RequestMeta`]
//!
//! # Execution Model
//!
//! 1. **Build** — one client per runner through the [`ClientFactory`]
//! 2. **Fan out** — all runners concurrently, each under its own timeout
//! 3. **Filter** — non-empty answers become candidates
//! 4. **Judge** — one sequential call scores candidates and picks a winner
//! 5. **Assemble** — scores are mapped back to runner indices
//!
//! ```rust,ignore
//! use swarmone_engine::{execute, ExecutionScope};
//!
//! let scope = ExecutionScope::with_timeout(config.server.request_timeout);
//! match execute(&scope, &config, &factory, "Capital of France?").await {
//!     Ok(consensus) => println!("{}", consensus.answer),
//!     Err(e) => eprintln!("{} (runner errors: {:?})", e, e.meta.runner_errors),
//! }
//! ```

mod candidates;
mod fanout;
mod judge;
mod scope;
mod scores;
mod verdict;

use std::time::Instant;

use swarmone_config::SwarmConfig;
use swarmone_core::{RequestMeta, SwarmError};
use swarmone_llm::ClientFactory;
use tracing::{info, warn};

pub use candidates::{build_candidates, included_indices, Candidate};
pub use fanout::{fan_out, FanOutResult, Runner};
pub use judge::{arbitrate, build_prompt, judge_timeout, Ruling};
pub use scope::ExecutionScope;
pub use scores::{argmax, clamp_round4, map_scores};
pub use verdict::{parse_verdict, strip_code_fence, JudgeParse, JudgeVerdict};

/// Winning answer and its scoring metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Consensus {
    pub answer: String,
    pub meta: RequestMeta,
}

/// A failed request, with whatever metadata was computed before failing.
///
/// `meta.winner_index` is always -1 and `meta.scores` all zeros.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct ExecuteError {
    pub source: SwarmError,
    pub meta: RequestMeta,
}

impl ExecuteError {
    fn new(source: SwarmError, meta: RequestMeta) -> Self {
        Self { source, meta }
    }
}

/// Generates an opaque per-request correlation token.
pub fn new_consensus_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Builds one client per configured runner, failing on the first bad one.
pub fn build_runners(config: &SwarmConfig, factory: &dyn ClientFactory) -> Result<Vec<Runner>, SwarmError> {
    config
        .runners
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let client = factory.build(spec).map_err(|e| SwarmError::ClientBuild {
                index,
                source: Box::new(e),
            })?;
            Ok(Runner {
                spec: spec.clone(),
                client,
            })
        })
        .collect()
}

/// Answers `instruction` with the judge-selected best runner answer.
///
/// Runner failures are absorbed into `runner_errors`; the request fails only
/// on configuration errors, when no runner produced text, or when the judge
/// fails. Every error carries a [`RequestMeta`] of the full runner length.
pub async fn execute(
    scope: &ExecutionScope,
    config: &SwarmConfig,
    factory: &dyn ClientFactory,
    instruction: &str,
) -> Result<Consensus, ExecuteError> {
    let consensus_id = new_consensus_id();
    let runner_count = config.runners.len();
    let failed = |included: Vec<usize>, errors: Vec<String>| {
        RequestMeta::failed(runner_count, included, errors, consensus_id.clone())
    };

    if runner_count == 0 {
        return Err(ExecuteError::new(SwarmError::NoRunners, failed(vec![], vec![])));
    }

    let runners = build_runners(config, factory)
        .map_err(|e| ExecuteError::new(e, failed(vec![], vec![String::new(); runner_count])))?;

    info!(
        consensus_id = %consensus_id,
        runners = runner_count,
        "fanning out: {}...",
        instruction.chars().take(50).collect::<String>()
    );
    let start = Instant::now();

    let FanOutResult { answers, errors } =
        fan_out(scope, &runners, instruction, config.server.runner_timeout).await;

    let candidates = build_candidates(&answers);
    let included = included_indices(&candidates);
    if candidates.is_empty() {
        warn!(consensus_id = %consensus_id, ?errors, "all runners failed");
        return Err(ExecuteError::new(SwarmError::AllRunnersFailed, failed(included, errors)));
    }

    let ruling = match arbitrate(scope, &config.consensus.judge, factory, instruction, &candidates).await {
        Ok(ruling) => ruling,
        Err(e) => {
            let e = SwarmError::judge(e);
            warn!(consensus_id = %consensus_id, error = %e, "judge failed");
            return Err(ExecuteError::new(e, failed(included, errors)));
        }
    };

    let scores = map_scores(&ruling.scores, &candidates, runner_count);
    let answer = answers[ruling.winner_index].clone();

    info!(
        consensus_id = %consensus_id,
        winner_index = ruling.winner_index,
        candidates = candidates.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "consensus reached"
    );

    Ok(Consensus {
        answer,
        meta: RequestMeta {
            winner_index: ruling.winner_index as i64,
            runner_count,
            scores,
            included_indices: included,
            consensus_id,
            runner_errors: errors,
        },
    })
}
