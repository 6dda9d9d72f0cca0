//! Score normalisation and projection onto runner indices.

use crate::candidates::Candidate;

/// Clamps to `[0, 1]` and rounds half-up to 4 decimals.
///
/// NaN is treated like a value above 1.
pub fn clamp_round4(x: f64) -> f64 {
    let x = if x.is_nan() || x > 1.0 { 1.0 } else { x.max(0.0) };
    (x * 10_000.0 + 0.5).floor() / 10_000.0
}

/// Spreads candidate-order scores over all `runner_count` slots.
///
/// Runners without a candidate score 0. A score vector whose length does not
/// match the candidates is ignored and every slot stays 0.
pub fn map_scores(candidate_scores: &[f64], candidates: &[Candidate], runner_count: usize) -> Vec<f64> {
    let mut scores = vec![0.0; runner_count];
    if candidate_scores.len() != candidates.len() {
        return scores;
    }
    for (candidate, &score) in candidates.iter().zip(candidate_scores) {
        if let Some(slot) = scores.get_mut(candidate.original_index) {
            *slot = clamp_round4(score);
        }
    }
    scores
}

/// Index of the highest score; the first occurrence wins ties.
pub fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, &s) in scores.iter().enumerate().skip(1) {
        if s > scores[best] {
            best = i;
        }
    }
    best
}
