use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Negative log-likelihood loss for a network whose output is log-softmax.
///
/// Paired with `log_softmax` this is categorical cross-entropy.
pub struct NllLoss;

impl NllLoss {
    /// Mean over the batch of `-log_probs[i, targets[i]]`.
    pub fn loss(log_probs: &Matrix, targets: &[usize]) -> Result<f64> {
        check_targets(log_probs, targets)?;
        let total: f64 = targets
            .iter()
            .enumerate()
            .map(|(i, &t)| -log_probs.get(i, t))
            .sum();
        Ok(total / targets.len() as f64)
    }

    /// ∂L/∂log_probs: `-1/N` at each sample's target, zero elsewhere.
    pub fn derivative(log_probs: &Matrix, targets: &[usize]) -> Result<Matrix> {
        check_targets(log_probs, targets)?;
        let n = targets.len() as f64;
        let mut grad = Matrix::zeros(log_probs.rows, log_probs.cols);
        for (i, &t) in targets.iter().enumerate() {
            grad.set(i, t, -1.0 / n);
        }
        Ok(grad)
    }
}

fn check_targets(log_probs: &Matrix, targets: &[usize]) -> Result<()> {
    if targets.is_empty() || targets.len() != log_probs.rows {
        return Err(Error::shape_mismatch(
            "targets",
            vec![log_probs.rows],
            vec![targets.len()],
        ));
    }
    if let Some(&target) = targets.iter().find(|&&t| t >= log_probs.cols) {
        return Err(Error::InvalidTarget {
            target,
            classes: log_probs.cols,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::log_softmax::log_softmax;
    use approx::assert_relative_eq;

    #[test]
    fn uniform_prediction_costs_ln_classes() {
        let lp = log_softmax(&Matrix::zeros(4, 10));
        let loss = NllLoss::loss(&lp, &[0, 3, 9, 5]).unwrap();
        assert_relative_eq!(loss, (10.0_f64).ln(), epsilon = 1e-12);
    }

    #[test]
    fn confident_correct_prediction_is_cheap() {
        let lp = log_softmax(&Matrix::from_vec(1, 3, vec![20.0, 0.0, 0.0]));
        assert!(NllLoss::loss(&lp, &[0]).unwrap() < 1e-6);
        assert!(NllLoss::loss(&lp, &[1]).unwrap() > 19.0);
    }

    #[test]
    fn derivative_is_sparse() {
        let lp = log_softmax(&Matrix::zeros(2, 3));
        let g = NllLoss::derivative(&lp, &[2, 0]).unwrap();
        assert_eq!(g.data, vec![0.0, 0.0, -0.5, -0.5, 0.0, 0.0]);
    }

    #[test]
    fn bad_targets_are_errors() {
        let lp = log_softmax(&Matrix::zeros(2, 3));
        assert!(matches!(
            NllLoss::loss(&lp, &[0, 3]),
            Err(Error::InvalidTarget { target: 3, classes: 3 })
        ));
        assert!(matches!(NllLoss::loss(&lp, &[0]), Err(Error::ShapeMismatch { .. })));
    }
}
