use rand::Rng;

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Fully-connected layer computing `y = x·W + b`.
///
/// `weights` is `(in_features, out_features)` and `biases` is
/// `(1, out_features)`. Gradients accumulate across `backward` calls until
/// `zero_grad` is called.
#[derive(Debug, Clone)]
pub struct Linear {
    pub in_features: usize,
    pub out_features: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub weight_grad: Matrix,
    pub bias_grad: Matrix,
    input: Option<Matrix>,
}

impl Linear {
    /// Initialises weights and biases from `U(-1/√in, 1/√in)`.
    pub fn new<R: Rng + ?Sized>(in_features: usize, out_features: usize, rng: &mut R) -> Linear {
        let bound = 1.0 / (in_features as f64).sqrt();
        Linear {
            in_features,
            out_features,
            weights: Matrix::uniform(in_features, out_features, bound, rng),
            biases: Matrix::uniform(1, out_features, bound, rng),
            weight_grad: Matrix::zeros(in_features, out_features),
            bias_grad: Matrix::zeros(1, out_features),
            input: None,
        }
    }

    /// Forward pass over a `(batch, in_features)` matrix; caches the input
    /// for `backward`.
    pub fn forward(&mut self, input: &Matrix) -> Matrix {
        let out = (input * &self.weights).add_row(&self.biases);
        self.input = Some(input.clone());
        out
    }

    /// Accumulates ∂L/∂W and ∂L/∂b from `grad_out` (∂L/∂y) and returns ∂L/∂x.
    pub fn backward(&mut self, grad_out: &Matrix) -> Result<Matrix> {
        let input = self
            .input
            .as_ref()
            .ok_or_else(|| Error::model("Linear::backward called before forward"))?;
        if grad_out.cols != self.out_features || grad_out.rows != input.rows {
            return Err(Error::shape_mismatch(
                "grad_out",
                vec![input.rows, self.out_features],
                grad_out.shape(),
            ));
        }

        self.weight_grad.add_assign(&(&input.transpose() * grad_out));
        self.bias_grad.add_assign(&grad_out.sum_rows());

        Ok(grad_out * &self.weights.transpose())
    }

    pub fn zero_grad(&mut self) {
        self.weight_grad.fill(0.0);
        self.bias_grad.fill(0.0);
    }

    /// Drops the cached forward input.
    pub fn clear_cache(&mut self) {
        self.input = None;
    }

    pub fn num_parameters(&self) -> usize {
        self.weights.data.len() + self.biases.data.len()
    }
}
