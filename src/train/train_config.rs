use std::path::Path;
use std::sync::mpsc;
use std::sync::{atomic::AtomicBool, Arc};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::optim::OptimizerConfig;
use crate::train::progress::TrainingProgress;

fn default_epochs() -> usize {
    2
}

fn default_batch_size() -> usize {
    64
}

fn default_print_every() -> usize {
    40
}

fn default_shuffle() -> bool {
    true
}

/// Configuration for a `train` run.
///
/// # Fields
/// - `epochs`:      total number of full passes over the training data
/// - `batch_size`:  samples per mini-batch
/// - `print_every`: run a validation pass and report every N steps
/// - `shuffle`:     reshuffle the training set every epoch
/// - `seed`:        seed the caller uses for network init and shuffling
/// - `optimizer`:   optimizer kind and learning rate
/// - `progress_tx`: optional channel sender; one `TrainingProgress` is sent
///                   per report. If the receiver is dropped the loop stops.
/// - `stop_flag`:   optional atomic flag; when set to `true` from another
///                   thread the loop stops before the next batch.
///
/// Only the hyperparameters are serialized; the channel and flag are
/// runtime hooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_print_every")]
    pub print_every: usize,
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(skip)]
    pub progress_tx: Option<mpsc::Sender<TrainingProgress>>,
    #[serde(skip)]
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            print_every: default_print_every(),
            shuffle: default_shuffle(),
            seed: None,
            optimizer: OptimizerConfig::default(),
            progress_tx: None,
            stop_flag: None,
        }
    }
}

impl TrainConfig {
    /// Creates a `TrainConfig` with no progress channel and no stop flag.
    pub fn new(epochs: usize, print_every: usize) -> Self {
        TrainConfig {
            epochs,
            print_every,
            ..TrainConfig::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::invalid_config("epochs must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(Error::invalid_config("batch_size must be at least 1"));
        }
        if self.print_every == 0 {
            return Err(Error::invalid_config("print_every must be at least 1"));
        }
        let lr = self.optimizer.learning_rate();
        if !(lr.is_finite() && lr > 0.0) {
            return Err(Error::invalid_config(format!("learning rate must be positive, got {lr}")));
        }
        Ok(())
    }

    /// Serializes the hyperparameters to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Loads and validates hyperparameters from JSON; missing fields take
    /// their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<TrainConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: TrainConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}
