use std::cmp::Ordering;

use crate::context::NumberContext;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredContext {
    pub context: NumberContext,
    pub similarity: f32,
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut a_norm = 0.0f32;
    let mut b_norm = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        a_norm += x * x;
        b_norm += y * y;
    }
    // zero vectors score 0.0
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    dot / (a_norm.sqrt() * b_norm.sqrt())
}

pub fn retain_well_formed(candidates: &mut Vec<NumberContext>, dimension: usize) {
    let before = candidates.len();
    candidates.retain(|candidate| candidate.is_well_formed(dimension));
    let dropped = before - candidates.len();
    if dropped > 0 {
        tracing::debug!("dropped {dropped} malformed candidate vectors");
    }
}

/// The `k` candidates most similar to `query`, most similar first. Equal
/// similarities keep their input order. Candidates with NaN components or a
/// length different from the query are skipped.
pub fn k_closest(query: &[f32], candidates: &[NumberContext], k: usize) -> Vec<ScoredContext> {
    if query.iter().any(|v| v.is_nan()) {
        tracing::debug!("query vector contains NaN, nothing to rank");
        return Vec::new();
    }
    let mut scored: Vec<ScoredContext> = candidates
        .iter()
        .filter(|candidate| candidate.is_well_formed(query.len()))
        .map(|candidate| ScoredContext {
            similarity: cosine_similarity(query, &candidate.context_vector),
            context: candidate.clone(),
        })
        .collect();
    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    scored.truncate(k);
    scored
}
