//! Fully-connected image classifiers: dense layers with dropout, log-softmax
//! output, NLL loss, backpropagation, SGD/Adam, a training loop with periodic
//! validation, and checkpoint save/load.

pub mod activation;
pub mod checkpoint;
pub mod data;
pub mod error;
pub mod layers;
pub mod loss;
pub mod math;
pub mod network;
pub mod optim;
pub mod train;
pub mod view;

// Convenience re-exports
pub use activation::ActivationFunction;
pub use checkpoint::{load_checkpoint, save_checkpoint, Checkpoint, CheckpointFormat};
pub use data::{Batch, DataLoader, Dataset, Normalize, Split};
pub use error::{Error, Result};
pub use loss::NllLoss;
pub use math::Matrix;
pub use network::{ModelMetadata, Network, NetworkSpec, StateDict, Tensor};
pub use optim::{Adam, Optimizer, OptimizerConfig, Sgd};
pub use train::{train, train_step, validation, TrainConfig, TrainingProgress, Validation};
