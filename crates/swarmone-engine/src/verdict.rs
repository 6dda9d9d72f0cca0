//! Turning judge output into a trusted verdict.
//!
//! Judge models are asked for `{"scores": [...], "winner": <int>}` but often
//! wrap it in a code fence, add prose, or get the winner wrong. Parsing is an
//! ordered ladder:
//!
//! 1. strict JSON after stripping one code fence ([`JudgeParse::Parsed`])
//! 2. numeric salvage plus a `winner` pattern search ([`JudgeParse::Repaired`])
//! 3. give up with a bounded excerpt ([`JudgeParse::Unparsable`])
//!
//! Whenever a score vector of the right length exists, an out-of-range
//! winner is replaced by the argmax of the scores.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::scores::{argmax, clamp_round4};

const EXCERPT_LIMIT: usize = 500;

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?\d+(?:\.\d+)?").expect("number regex is valid"));

static WINNER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"?winner"?\s*[:=]\s*([-+]?\d+)"#).expect("winner regex is valid")
});

/// Validated judge decision over candidate indices.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeVerdict {
    /// One score per candidate, clamped to `[0, 1]` with 4 decimals.
    pub scores: Vec<f64>,
    /// Candidate index of the winner, always `< scores.len()`.
    pub winner: usize,
}

/// Outcome of reading a judge response.
#[derive(Debug, Clone, PartialEq)]
pub enum JudgeParse {
    /// The response was the requested JSON object.
    Parsed(JudgeVerdict),
    /// The response was salvaged from loose text.
    Repaired(JudgeVerdict),
    /// Nothing usable; carries a truncated excerpt of the response.
    Unparsable(String),
}

#[cfg(test)]
impl JudgeParse {
    fn into_verdict(self) -> Option<JudgeVerdict> {
        match self {
            JudgeParse::Parsed(v) | JudgeParse::Repaired(v) => Some(v),
            JudgeParse::Unparsable(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct RawVerdict {
    #[serde(default)]
    scores: Vec<f64>,
    #[serde(default)]
    winner: Option<i64>,
}

/// Reads a judge response for `candidates` candidates.
pub fn parse_verdict(raw: &str, candidates: usize) -> JudgeParse {
    let text = strip_code_fence(raw);
    if candidates == 0 {
        return JudgeParse::Unparsable(excerpt("no candidates to score: ", text));
    }

    if let Ok(parsed) = serde_json::from_str::<RawVerdict>(text) {
        if parsed.scores.len() != candidates {
            let prefix = format!("expected {} scores, got {}: ", candidates, parsed.scores.len());
            return JudgeParse::Unparsable(excerpt(&prefix, text));
        }
        return JudgeParse::Parsed(validate(parsed.scores, parsed.winner));
    }

    let numbers = extract_numbers(text);
    let winner = find_winner(text);
    match winner {
        Some(winner) if numbers.len() >= candidates => {
            let scores = numbers.into_iter().take(candidates).collect();
            JudgeParse::Repaired(validate(scores, Some(winner)))
        }
        _ => JudgeParse::Unparsable(excerpt("", text)),
    }
}

/// Falls back to argmax for a missing or out-of-range winner, then clamps.
fn validate(scores: Vec<f64>, winner: Option<i64>) -> JudgeVerdict {
    let winner = winner
        .and_then(|w| usize::try_from(w).ok())
        .filter(|&w| w < scores.len())
        .unwrap_or_else(|| argmax(&scores));
    JudgeVerdict {
        scores: scores.into_iter().map(clamp_round4).collect(),
        winner,
    }
}

/// Removes one surrounding Markdown code fence, including its language tag.
pub fn strip_code_fence(s: &str) -> &str {
    let mut s = s.trim();
    if let Some(rest) = s.strip_prefix("```") {
        if let Some(newline) = rest.find('\n') {
            s = &rest[newline + 1..];
        }
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

fn extract_numbers(s: &str) -> Vec<f64> {
    NUMBER_RE
        .find_iter(s)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

fn find_winner(s: &str) -> Option<i64> {
    WINNER_RE
        .captures(s)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// `prefix` followed by `s`, at most [`EXCERPT_LIMIT`] characters in total
/// and ending in `...` when `s` is cut.
fn excerpt(prefix: &str, s: &str) -> String {
    let room = EXCERPT_LIMIT.saturating_sub(prefix.chars().count());
    let mut out = prefix.to_string();
    if s.chars().count() <= room {
        out.push_str(s);
    } else {
        out.extend(s.chars().take(room.saturating_sub(3)));
        out.push_str("...");
    }
    out
}
