use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// A named block of parameters, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl Tensor {
    /// Element count implied by `shape`, saturating at `usize::MAX` so a
    /// corrupt shape never overflows.
    pub fn numel(&self) -> usize {
        self.shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .unwrap_or(usize::MAX)
    }

    /// Views a two-dimensional tensor as a `Matrix`.
    pub fn to_matrix(&self) -> Result<Matrix> {
        if self.shape.len() != 2 || self.numel() != self.data.len() {
            return Err(Error::checkpoint(format!(
                "tensor of shape {:?} with {} values is not a valid matrix",
                self.shape,
                self.data.len()
            )));
        }
        Ok(Matrix::from_vec(self.shape[0], self.shape[1], self.data.clone()))
    }
}

impl From<&Matrix> for Tensor {
    fn from(m: &Matrix) -> Self {
        Tensor {
            shape: m.shape(),
            data: m.data.clone(),
        }
    }
}

/// Ordered mapping from parameter name to tensor.
///
/// Names follow `hidden_layers.{i}.weight`, `hidden_layers.{i}.bias`,
/// `output.weight`, `output.bias`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDict(BTreeMap<String, Tensor>);

impl StateDict {
    pub fn new() -> Self {
        StateDict(BTreeMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor) -> Option<Tensor> {
        self.0.insert(name.into(), tensor)
    }

    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Tensor> {
        self.0.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Tensor> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Tensor)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of scalar parameters.
    pub fn num_parameters(&self) -> usize {
        self.0.values().map(|t| t.data.len()).sum()
    }
}
