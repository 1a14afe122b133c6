use rand::Rng;

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Inverted dropout.
///
/// In training mode each activation is zeroed with probability `p` and the
/// survivors are scaled by `1 / (1 - p)`, so eval mode is a plain identity.
#[derive(Debug, Clone)]
pub struct Dropout {
    p: f64,
    mask: Option<Matrix>,
}

impl Dropout {
    pub fn new(p: f64) -> Result<Dropout> {
        if !(0.0..1.0).contains(&p) {
            return Err(Error::invalid_config(format!(
                "dropout probability must be in [0, 1), got {p}"
            )));
        }
        Ok(Dropout { p, mask: None })
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    pub fn forward<R: Rng + ?Sized>(&mut self, input: &Matrix, training: bool, rng: &mut R) -> Matrix {
        if !training || self.p == 0.0 {
            self.mask = None;
            return input.clone();
        }
        let keep = 1.0 - self.p;
        let scale = 1.0 / keep;
        let mask = Matrix::from_vec(
            input.rows,
            input.cols,
            (0..input.data.len())
                .map(|_| if rng.gen::<f64>() < keep { scale } else { 0.0 })
                .collect(),
        );
        let out = input.hadamard(&mask);
        self.mask = Some(mask);
        out
    }

    /// Routes the gradient through the units kept in the last forward pass.
    pub fn backward(&self, grad_out: &Matrix) -> Matrix {
        match &self.mask {
            Some(mask) => grad_out.hadamard(mask),
            None => grad_out.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn rejects_out_of_range_probability() {
        assert!(Dropout::new(1.0).is_err());
        assert!(Dropout::new(-0.1).is_err());
        assert!(Dropout::new(0.0).is_ok());
    }

    #[test]
    fn eval_mode_is_identity() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut d = Dropout::new(0.5).unwrap();
        let x = Matrix::from_vec(1, 4, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(d.forward(&x, false, &mut rng), x);
        assert_eq!(d.backward(&x), x);
    }

    #[test]
    fn training_mode_preserves_expectation() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut d = Dropout::new(0.5).unwrap();
        let x = Matrix::from_vec(100, 100, vec![1.0; 10_000]);
        let y = d.forward(&x, true, &mut rng);

        let zeros = y.data.iter().filter(|&&v| v == 0.0).count();
        assert!(zeros > 4_500 && zeros < 5_500, "dropped {zeros} of 10000");
        assert!(y.data.iter().all(|&v| v == 0.0 || v == 2.0));
        let mean = y.data.iter().sum::<f64>() / y.data.len() as f64;
        assert_relative_eq!(mean, 1.0, epsilon = 0.05);
    }

    #[test]
    fn backward_uses_forward_mask() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut d = Dropout::new(0.3).unwrap();
        let x = Matrix::from_vec(2, 5, vec![1.0; 10]);
        let y = d.forward(&x, true, &mut rng);
        let g = d.backward(&x);
        assert_eq!(y, g);
    }
}
