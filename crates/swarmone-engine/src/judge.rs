//! Judge arbitration: prompt, bounded call, verdict.

use std::time::{Duration, Instant};

use serde_json::json;
use swarmone_core::{JudgeSpec, SwarmError};
use swarmone_llm::ClientFactory;
use tracing::{info, warn};

use crate::candidates::Candidate;
use crate::scope::{bounded, ExecutionScope};
use crate::verdict::{parse_verdict, JudgeParse};

const DEFAULT_JUDGE_MAX_TOKENS: u32 = 256;
const JUDGE_TIMEOUT_FLOOR: Duration = Duration::from_secs(10);
const JUDGE_TIMEOUT_CEILING: Duration = Duration::from_secs(30);
const JUDGE_TIMEOUT_UNBOUNDED: Duration = Duration::from_secs(20);

const JUDGE_PREAMBLE: &str = "You are a strict impartial judge.\n\
Score every candidate between 0 and 1 (4 decimals). Higher is better.\n\
Choose ONE winner. Return ONLY JSON as specified.\n\n";

const CRITERIA: [&str; 4] = [
    "Task match / completeness",
    "Clarity / organization",
    "Factuality / safety",
    "Tone / style follows Language",
];

/// The judge's decision mapped back to runner indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Ruling {
    /// Runner index of the winning candidate.
    pub winner_index: usize,
    /// Clamped scores in candidate order.
    pub scores: Vec<f64>,
}

/// Builds the scoring request sent to the judge.
///
/// Candidates are numbered by their position in `candidates`, never by
/// runner index.
pub fn build_prompt(instruction: &str, candidates: &[Candidate]) -> String {
    let listed: Vec<_> = candidates
        .iter()
        .enumerate()
        .map(|(index, c)| json!({ "index": index, "text": c.text }))
        .collect();

    let request = json!({
        "task": "score each candidate and choose a single best one",
        "instruction": instruction,
        "candidates": listed,
        "schema": {
            "scores": "array of numbers in [0,1] with 4 decimals, length == number of candidates",
            "winner": "integer candidate index",
        },
        "criteria": CRITERIA,
        "format": "Return ONLY JSON: {\"scores\":[...], \"winner\": <int>}",
    });

    format!("{}{}", JUDGE_PREAMBLE, request)
}

/// 80% of the remaining budget clamped to 10..=30s, or 20s without a deadline.
pub fn judge_timeout(remaining: Option<Duration>) -> Duration {
    match remaining {
        Some(rem) => rem
            .mul_f64(0.8)
            .clamp(JUDGE_TIMEOUT_FLOOR, JUDGE_TIMEOUT_CEILING),
        None => JUDGE_TIMEOUT_UNBOUNDED,
    }
}

/// Scores `candidates` with the configured judge and picks a winner.
///
/// The judge call never outlives the scope's deadline, even when the
/// derived timeout is longer. An empty candidate list fails with
/// [`SwarmError::AllRunnersFailed`] without contacting the judge.
pub async fn arbitrate(
    scope: &ExecutionScope,
    judge: &JudgeSpec,
    factory: &dyn ClientFactory,
    instruction: &str,
    candidates: &[Candidate],
) -> Result<Ruling, SwarmError> {
    if !judge.is_configured() {
        return Err(SwarmError::JudgeNotConfigured);
    }
    if candidates.is_empty() {
        return Err(SwarmError::AllRunnersFailed);
    }
    let spec = judge.as_runner();
    let client = factory.build(&spec)?;

    let remaining = scope.remaining();
    let timeout = judge_timeout(remaining);
    let budget = remaining.map_or(timeout, |r| timeout.min(r));
    let max_tokens = match spec.token_budget() {
        0 => DEFAULT_JUDGE_MAX_TOKENS,
        n => n,
    };

    let prompt = build_prompt(instruction, candidates);
    let start = Instant::now();
    let response = bounded(Some(budget), "judge", client.generate(&prompt, max_tokens)).await?;

    let text = response.content.trim();
    if text.is_empty() {
        return Err(SwarmError::JudgeEmpty);
    }

    let verdict = match parse_verdict(text, candidates.len()) {
        JudgeParse::Parsed(v) => v,
        JudgeParse::Repaired(v) => {
            warn!(model = %judge.model, "judge output was not valid JSON, repaired");
            v
        }
        JudgeParse::Unparsable(excerpt) => return Err(SwarmError::JudgeUnparsable(excerpt)),
    };

    let winner_index = candidates[verdict.winner].original_index;
    info!(
        model = %judge.model,
        elapsed_ms = start.elapsed().as_millis() as u64,
        candidates = candidates.len(),
        winner_index,
        "judge decided"
    );

    Ok(Ruling {
        winner_index,
        scores: verdict.scores,
    })
}
