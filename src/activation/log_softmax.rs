use crate::math::matrix::Matrix;

/// Row-wise log-softmax: `z_i - max(z) - ln Σ exp(z_j - max(z))`.
pub fn log_softmax(logits: &Matrix) -> Matrix {
    let mut out = logits.clone();
    for r in 0..out.rows {
        let row = out.row_mut(r);
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let log_sum = row.iter().map(|z| (z - max).exp()).sum::<f64>().ln();
        for z in row.iter_mut() {
            *z = *z - max - log_sum;
        }
    }
    out
}

/// Gradient of log-softmax with respect to its logits.
///
/// `grad_out` is ∂L/∂(log p) and `log_probs` the cached forward output;
/// returns `grad_out - softmax ⊙ Σ_j grad_out_j` per row.
pub fn log_softmax_backward(grad_out: &Matrix, log_probs: &Matrix) -> Matrix {
    assert_eq!(grad_out.shape(), log_probs.shape(), "Matrices are of incorrect sizes");
    let mut grad = grad_out.clone();
    for r in 0..grad.rows {
        let total: f64 = grad_out.row(r).iter().sum();
        let lp = log_probs.row(r);
        for (g, l) in grad.row_mut(r).iter_mut().zip(lp) {
            *g -= l.exp() * total;
        }
    }
    grad
}
