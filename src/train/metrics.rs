use crate::math::matrix::{argmax, Matrix};

/// Number of rows whose highest-scoring class equals the target.
pub fn correct_predictions(scores: &Matrix, targets: &[usize]) -> usize {
    scores
        .argmax_rows()
        .iter()
        .zip(targets)
        .filter(|(pred, target)| pred == target)
        .count()
}

/// Top-1 accuracy of `scores` (log-probabilities or probabilities).
pub fn accuracy(scores: &Matrix, targets: &[usize]) -> f64 {
    if targets.is_empty() {
        return 0.0;
    }
    correct_predictions(scores, targets) as f64 / targets.len() as f64
}

/// The `k` most likely classes as `(class, probability)`, best first.
pub fn top_k(probs: &[f64], k: usize) -> Vec<(usize, f64)> {
    let mut ranked: Vec<(usize, f64)> = probs.iter().cloned().enumerate().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(k);
    ranked
}

/// Most likely class of a single probability row.
pub fn top_1(probs: &[f64]) -> usize {
    argmax(probs)
}
