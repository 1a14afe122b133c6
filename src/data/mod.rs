pub mod dataset;
pub mod idx;
pub mod loader;
pub mod transform;

pub use dataset::{Dataset, Split, FASHION_MNIST_CLASSES, MNIST_CLASSES};
pub use loader::{Batch, Batches, DataLoader};
pub use transform::Normalize;
