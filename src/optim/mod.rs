pub mod adam;
pub mod sgd;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::math::matrix::Matrix;

pub use adam::Adam;
pub use sgd::Sgd;

/// A learnable parameter together with its accumulated gradient.
pub struct Parameter<'a> {
    pub name: String,
    pub value: &'a mut Matrix,
    pub grad: &'a Matrix,
}

/// Updates parameters from their gradients.
///
/// Optimizers keep per-parameter state by position, so `step` must always be
/// called with the parameters of the same network in the same order.
pub trait Optimizer {
    fn step(&mut self, params: Vec<Parameter<'_>>) -> Result<()>;

    fn learning_rate(&self) -> f64;

    fn name(&self) -> &'static str;
}

/// Serializable optimizer choice used by `TrainConfig`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizerConfig {
    Sgd {
        learning_rate: f64,
        #[serde(default)]
        momentum: f64,
    },
    Adam {
        learning_rate: f64,
    },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::Adam { learning_rate: 0.001 }
    }
}

impl OptimizerConfig {
    pub fn learning_rate(&self) -> f64 {
        match self {
            OptimizerConfig::Sgd { learning_rate, .. } | OptimizerConfig::Adam { learning_rate } => {
                *learning_rate
            }
        }
    }

    /// Replaces the learning rate, keeping the optimizer kind.
    pub fn with_learning_rate(self, lr: f64) -> Self {
        match self {
            OptimizerConfig::Sgd { momentum, .. } => OptimizerConfig::Sgd { learning_rate: lr, momentum },
            OptimizerConfig::Adam { .. } => OptimizerConfig::Adam { learning_rate: lr },
        }
    }

    pub fn build(&self) -> Result<Box<dyn Optimizer>> {
        Ok(match *self {
            OptimizerConfig::Sgd { learning_rate, momentum } => {
                Box::new(Sgd::with_momentum(learning_rate, momentum)?)
            }
            OptimizerConfig::Adam { learning_rate } => Box::new(Adam::new(learning_rate)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parses_tagged_json() {
        let cfg: OptimizerConfig =
            serde_json::from_str(r#"{"type": "sgd", "learning_rate": 0.01}"#).unwrap();
        assert_eq!(cfg, OptimizerConfig::Sgd { learning_rate: 0.01, momentum: 0.0 });

        let cfg: OptimizerConfig =
            serde_json::from_str(r#"{"type": "adam", "learning_rate": 0.003}"#).unwrap();
        assert_eq!(cfg.learning_rate(), 0.003);
    }

    #[test]
    fn build_validates_hyperparameters() {
        assert!(OptimizerConfig::Adam { learning_rate: 0.0 }.build().is_err());
        assert!(OptimizerConfig::Sgd { learning_rate: 0.1, momentum: 1.5 }.build().is_err());
        let opt = OptimizerConfig::default().build().unwrap();
        assert_eq!(opt.name(), "adam");
        assert_eq!(opt.learning_rate(), 0.001);
    }

    #[test]
    fn with_learning_rate_keeps_kind() {
        let cfg = OptimizerConfig::Sgd { learning_rate: 0.1, momentum: 0.9 }.with_learning_rate(0.5);
        assert_eq!(cfg, OptimizerConfig::Sgd { learning_rate: 0.5, momentum: 0.9 });
    }
}
