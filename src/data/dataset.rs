use std::path::{Path, PathBuf};

use tracing::info;

use crate::data::idx::{parse_idx_images, parse_idx_labels, read_idx_file};
use crate::error::{Error, Result};

/// Class names of Fashion-MNIST, in label order.
pub const FASHION_MNIST_CLASSES: [&str; 10] = [
    "T-shirt/top",
    "Trouser",
    "Pullover",
    "Dress",
    "Coat",
    "Sandal",
    "Shirt",
    "Sneaker",
    "Bag",
    "Ankle boot",
];

/// Class names of MNIST digits.
pub const MNIST_CLASSES: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

/// Which half of a dataset to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    fn prefix(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "t10k",
        }
    }
}

/// Labeled grayscale images kept as raw `u8` pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pixels: Vec<u8>,
    labels: Vec<usize>,
    rows: usize,
    cols: usize,
    class_names: Vec<String>,
}

impl Dataset {
    /// Builds a dataset from a flat pixel buffer; every label must index
    /// into `class_names`.
    pub fn new(
        pixels: Vec<u8>,
        labels: Vec<usize>,
        rows: usize,
        cols: usize,
        class_names: Vec<String>,
    ) -> Result<Dataset> {
        let n_pixels = rows * cols;
        if n_pixels == 0 {
            return Err(Error::dataset("images must have at least one pixel"));
        }
        if pixels.len() != labels.len() * n_pixels {
            return Err(Error::dataset(format!(
                "{} labels need {} pixels of {rows}x{cols} images, got {}",
                labels.len(),
                labels.len() * n_pixels,
                pixels.len()
            )));
        }
        if class_names.len() < 2 {
            return Err(Error::dataset(format!(
                "at least 2 classes are required, got {}",
                class_names.len()
            )));
        }
        if let Some((i, &label)) = labels.iter().enumerate().find(|(_, &l)| l >= class_names.len()) {
            return Err(Error::dataset(format!(
                "label at index {i}: class {label} is out of range for {} classes",
                class_names.len()
            )));
        }
        Ok(Dataset { pixels, labels, rows, cols, class_names })
    }

    /// Loads an IDX image/label pair (plain or `.gz`).
    pub fn from_idx_files(images: &Path, labels: &Path, class_names: &[&str]) -> Result<Dataset> {
        let images = parse_idx_images(&read_idx_file(images)?)?;
        let labels = parse_idx_labels(&read_idx_file(labels)?)?;
        if images.count != labels.len() {
            return Err(Error::dataset(format!(
                "IDX file mismatch: image file declares {} items but label file declares {}",
                images.count,
                labels.len()
            )));
        }
        Dataset::new(
            images.pixels,
            labels.into_iter().map(usize::from).collect(),
            images.rows,
            images.cols,
            class_names.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Fashion-MNIST from `dir` using the standard file names.
    pub fn fashion_mnist(dir: &Path, split: Split) -> Result<Dataset> {
        Dataset::standard_idx(dir, split, &FASHION_MNIST_CLASSES)
    }

    /// MNIST digits from `dir` using the standard file names.
    pub fn mnist(dir: &Path, split: Split) -> Result<Dataset> {
        Dataset::standard_idx(dir, split, &MNIST_CLASSES)
    }

    fn standard_idx(dir: &Path, split: Split, class_names: &[&str]) -> Result<Dataset> {
        let images = locate(dir, &format!("{}-images-idx3-ubyte", split.prefix()))?;
        let labels = locate(dir, &format!("{}-labels-idx1-ubyte", split.prefix()))?;
        let dataset = Dataset::from_idx_files(&images, &labels, class_names)?;
        info!(
            split = ?split,
            samples = dataset.len(),
            rows = dataset.rows,
            cols = dataset.cols,
            "loaded dataset from {}",
            dir.display()
        );
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Flattened input width (`rows * cols`).
    pub fn input_size(&self) -> usize {
        self.rows * self.cols
    }

    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Raw pixels and label of sample `index`.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    pub fn get(&self, index: usize) -> (&[u8], usize) {
        let n = self.input_size();
        (&self.pixels[index * n..(index + 1) * n], self.labels[index])
    }

    /// Copies the first `n` samples (or all of them, if fewer).
    pub fn take(&self, n: usize) -> Dataset {
        let n = n.min(self.len());
        Dataset {
            pixels: self.pixels[..n * self.input_size()].to_vec(),
            labels: self.labels[..n].to_vec(),
            rows: self.rows,
            cols: self.cols,
            class_names: self.class_names.clone(),
        }
    }
}

/// Finds `name` or `name.gz` inside `dir`.
fn locate(dir: &Path, name: &str) -> Result<PathBuf> {
    let plain = dir.join(name);
    if plain.is_file() {
        return Ok(plain);
    }
    let gz = dir.join(format!("{name}.gz"));
    if gz.is_file() {
        return Ok(gz);
    }
    Err(Error::dataset(format!(
        "neither {} nor {} exists",
        plain.display(),
        gz.display()
    )))
}
