use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::dataset::Dataset;
use crate::data::transform::Normalize;
use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// One mini-batch: `(batch, input_size)` inputs and their class indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub inputs: Matrix,
    pub targets: Vec<usize>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Iterates a `Dataset` in normalised mini-batches.
///
/// With `shuffle` enabled every call to `iter` draws a fresh permutation.
/// The final batch is short when the batch size does not divide the dataset.
pub struct DataLoader<'a> {
    dataset: &'a Dataset,
    batch_size: usize,
    shuffle: bool,
    transform: Normalize,
    rng: StdRng,
}

impl<'a> DataLoader<'a> {
    pub fn new(dataset: &'a Dataset, batch_size: usize, shuffle: bool) -> Result<DataLoader<'a>> {
        if batch_size == 0 {
            return Err(Error::invalid_config("batch_size must be at least 1"));
        }
        Ok(DataLoader {
            dataset,
            batch_size,
            shuffle,
            transform: Normalize::default(),
            rng: StdRng::from_entropy(),
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_transform(mut self, transform: Normalize) -> Self {
        self.transform = transform;
        self
    }

    pub fn dataset(&self) -> &Dataset {
        self.dataset
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn transform(&self) -> Normalize {
        self.transform
    }

    /// Number of batches per pass.
    pub fn len(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Starts a new pass over the dataset.
    pub fn iter(&mut self) -> Batches<'_> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if self.shuffle {
            order.shuffle(&mut self.rng);
        }
        Batches {
            dataset: self.dataset,
            transform: self.transform,
            batch_size: self.batch_size,
            order,
            cursor: 0,
        }
    }
}

/// One pass of a `DataLoader`.
pub struct Batches<'a> {
    dataset: &'a Dataset,
    transform: Normalize,
    batch_size: usize,
    order: Vec<usize>,
    cursor: usize,
}

impl Iterator for Batches<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let indices = &self.order[self.cursor..end];
        self.cursor = end;

        let width = self.dataset.input_size();
        let mut data = Vec::with_capacity(indices.len() * width);
        let mut targets = Vec::with_capacity(indices.len());
        for &idx in indices {
            let (pixels, label) = self.dataset.get(idx);
            data.extend(pixels.iter().map(|&p| self.transform.apply(p)));
            targets.push(label);
        }

        Some(Batch {
            inputs: Matrix::from_vec(indices.len(), width, data),
            targets,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.order.len() - self.cursor).div_ceil(self.batch_size);
        (remaining, Some(remaining))
    }
}
