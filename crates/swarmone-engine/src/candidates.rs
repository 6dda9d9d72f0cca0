/// A non-empty runner answer eligible for judging.
///
/// The candidate's position in its list is local to one judge call;
/// `original_index` is the runner position reported to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub original_index: usize,
    pub text: String,
}

/// Keeps the answers whose trimmed text is non-empty, in runner order.
pub fn build_candidates(answers: &[String]) -> Vec<Candidate> {
    answers
        .iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(original_index, text)| Candidate {
            original_index,
            text: text.clone(),
        })
        .collect()
}

/// Runner indices that survived filtering, ascending.
pub fn included_indices(candidates: &[Candidate]) -> Vec<usize> {
    candidates.iter().map(|c| c.original_index).collect()
}
