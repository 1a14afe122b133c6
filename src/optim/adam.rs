use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::optim::{Optimizer, Parameter};

/// Adam with bias-corrected first and second moment estimates.
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
    t: u64,
    m: Vec<Matrix>,
    v: Vec<Matrix>,
}

impl Adam {
    /// `β1 = 0.9`, `β2 = 0.999`, `ε = 1e-8`.
    pub fn new(learning_rate: f64) -> Result<Adam> {
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(Error::invalid_config(format!(
                "learning rate must be positive, got {learning_rate}"
            )));
        }
        Ok(Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            t: 0,
            m: Vec::new(),
            v: Vec::new(),
        })
    }

    /// Number of steps taken since the moment buffers were last reset.
    pub fn steps(&self) -> u64 {
        self.t
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: Vec<Parameter<'_>>) -> Result<()> {
        if self.m.len() != params.len()
            || self.m.iter().zip(&params).any(|(m, p)| m.shape() != p.value.shape())
        {
            self.m = params.iter().map(|p| Matrix::zeros(p.value.rows, p.value.cols)).collect();
            self.v = self.m.clone();
            self.t = 0;
        }

        self.t += 1;
        let bias1 = 1.0 - self.beta1.powi(self.t as i32);
        let bias2 = 1.0 - self.beta2.powi(self.t as i32);

        for ((param, m_buf), v_buf) in params.into_iter().zip(self.m.iter_mut()).zip(self.v.iter_mut()) {
            for (((w, g), m), v) in param
                .value
                .data
                .iter_mut()
                .zip(&param.grad.data)
                .zip(m_buf.data.iter_mut())
                .zip(v_buf.data.iter_mut())
            {
                *m = self.beta1 * *m + (1.0 - self.beta1) * g;
                *v = self.beta2 * *v + (1.0 - self.beta2) * g * g;
                let m_hat = *m / bias1;
                let v_hat = *v / bias2;
                *w -= self.learning_rate * m_hat / (v_hat.sqrt() + self.eps);
            }
        }
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn name(&self) -> &'static str {
        "adam"
    }
}
