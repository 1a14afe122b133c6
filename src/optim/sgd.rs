use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::optim::{Optimizer, Parameter};

/// Stochastic gradient descent with optional momentum.
pub struct Sgd {
    pub learning_rate: f64,
    pub momentum: f64,
    velocity: Vec<Matrix>,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Result<Sgd> {
        Sgd::with_momentum(learning_rate, 0.0)
    }

    pub fn with_momentum(learning_rate: f64, momentum: f64) -> Result<Sgd> {
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(Error::invalid_config(format!(
                "learning rate must be positive, got {learning_rate}"
            )));
        }
        if !(0.0..1.0).contains(&momentum) {
            return Err(Error::invalid_config(format!(
                "momentum must be in [0, 1), got {momentum}"
            )));
        }
        Ok(Sgd { learning_rate, momentum, velocity: Vec::new() })
    }
}

impl Optimizer for Sgd {
    /// `v ← μ·v + g`, `θ ← θ - lr·v`.
    fn step(&mut self, params: Vec<Parameter<'_>>) -> Result<()> {
        if self.velocity.len() != params.len()
            || self.velocity.iter().zip(&params).any(|(v, p)| v.shape() != p.value.shape())
        {
            self.velocity = params.iter().map(|p| Matrix::zeros(p.value.rows, p.value.cols)).collect();
        }

        for (param, velocity) in params.into_iter().zip(self.velocity.iter_mut()) {
            for ((w, g), v) in param
                .value
                .data
                .iter_mut()
                .zip(&param.grad.data)
                .zip(velocity.data.iter_mut())
            {
                *v = self.momentum * *v + g;
                *w -= self.learning_rate * *v;
            }
        }
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn name(&self) -> &'static str {
        "sgd"
    }
}
