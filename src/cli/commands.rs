use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use ferrite_classifier::{ActivationFunction, OptimizerConfig, TrainConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a classifier and save a checkpoint
    Train(TrainArgs),
    /// Report test loss and accuracy of a checkpoint
    Evaluate(EvaluateArgs),
    /// Classify one image and print the most likely classes
    Predict(PredictArgs),
    /// Print the architecture and parameter shapes stored in a checkpoint
    Inspect(InspectArgs),
}

/// Which IDX dataset a directory holds.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatasetKind {
    FashionMnist,
    Mnist,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptimizerKind {
    Adam,
    Sgd,
}

/// Dataset location shared by every data-consuming command.
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Directory holding the IDX files (plain or .gz)
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = DatasetKind::FashionMnist)]
    pub dataset: DatasetKind,

    /// Use only the first N samples of each split
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Hidden layer widths, comma separated
    #[arg(long, value_delimiter = ',', default_value = "512,256,128")]
    pub hidden: Vec<usize>,

    /// Dropout probability after every hidden layer
    #[arg(long, default_value_t = 0.5)]
    pub drop_p: f64,

    /// Hidden activation: relu, sigmoid, tanh, identity
    #[arg(long, default_value = "relu")]
    pub activation: ActivationFunction,

    /// JSON training config; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub epochs: Option<usize>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Validate and report every N steps
    #[arg(long)]
    pub print_every: Option<usize>,

    #[arg(long, value_enum)]
    pub optimizer: Option<OptimizerKind>,

    #[arg(long)]
    pub lr: Option<f64>,

    /// Momentum for SGD
    #[arg(long)]
    pub momentum: Option<f64>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Keep the training order fixed across epochs
    #[arg(long)]
    pub no_shuffle: bool,

    /// Where to write the checkpoint (.json for JSON, anything else binary)
    #[arg(long, short, default_value = "checkpoint.pth")]
    pub output: PathBuf,
}

impl TrainArgs {
    /// Overlays explicitly given flags on top of `config`.
    pub fn apply(&self, config: &mut TrainConfig) {
        if let Some(epochs) = self.epochs {
            config.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(print_every) = self.print_every {
            config.print_every = print_every;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.no_shuffle {
            config.shuffle = false;
        }

        let lr = self.lr.unwrap_or_else(|| config.optimizer.learning_rate());
        let (configured_kind, configured_momentum) = match config.optimizer {
            OptimizerConfig::Sgd { momentum, .. } => (OptimizerKind::Sgd, momentum),
            OptimizerConfig::Adam { .. } => (OptimizerKind::Adam, 0.0),
        };
        config.optimizer = match self.optimizer.unwrap_or(configured_kind) {
            OptimizerKind::Adam => OptimizerConfig::Adam { learning_rate: lr },
            OptimizerKind::Sgd => OptimizerConfig::Sgd {
                learning_rate: lr,
                momentum: self.momentum.unwrap_or(configured_momentum),
            },
        };
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[arg(long, short)]
    pub checkpoint: PathBuf,

    #[command(flatten)]
    pub data: DataArgs,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    #[arg(long, short)]
    pub checkpoint: PathBuf,

    /// Classify an arbitrary image file (resized and converted to grayscale)
    #[arg(long, conflicts_with = "index")]
    pub image: Option<PathBuf>,

    /// Classify sample N of the test split instead
    #[arg(long, default_value_t = 0)]
    pub index: usize,

    #[command(flatten)]
    pub data: DataArgs,

    /// How many classes to print
    #[arg(long, default_value_t = 5)]
    pub top_k: usize,

    /// Write the image and class probabilities as a PNG
    #[arg(long)]
    pub plot: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[arg(long, short)]
    pub checkpoint: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn train_args(argv: &[&str]) -> TrainArgs {
        let mut full = vec!["ferrite-classifier", "train"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Train(args) => args,
            other => panic!("expected train, got {other:?}"),
        }
    }

    #[test]
    fn train_defaults() {
        let args = train_args(&[]);
        assert_eq!(args.hidden, vec![512, 256, 128]);
        assert_eq!(args.drop_p, 0.5);
        assert_eq!(args.activation, ActivationFunction::ReLU);
        assert_eq!(args.data.dataset, DatasetKind::FashionMnist);
        assert_eq!(args.output, PathBuf::from("checkpoint.pth"));
    }

    #[test]
    fn flags_override_config() {
        let args = train_args(&[
            "--hidden", "64,32", "--epochs", "5", "--optimizer", "sgd", "--lr", "0.1", "--momentum", "0.9",
        ]);
        assert_eq!(args.hidden, vec![64, 32]);

        let mut config = TrainConfig::default();
        args.apply(&mut config);
        assert_eq!(config.epochs, 5);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.optimizer, OptimizerConfig::Sgd { learning_rate: 0.1, momentum: 0.9 });
    }

    #[test]
    fn configured_momentum_survives_unrelated_flags() {
        let mut config = TrainConfig {
            optimizer: OptimizerConfig::Sgd { learning_rate: 0.1, momentum: 0.9 },
            ..TrainConfig::default()
        };
        train_args(&["--optimizer", "sgd", "--lr", "0.05"]).apply(&mut config);
        assert_eq!(config.optimizer, OptimizerConfig::Sgd { learning_rate: 0.05, momentum: 0.9 });

        train_args(&["--momentum", "0.5"]).apply(&mut config);
        assert_eq!(config.optimizer, OptimizerConfig::Sgd { learning_rate: 0.05, momentum: 0.5 });
    }

    #[test]
    fn lr_alone_keeps_configured_optimizer() {
        let args = train_args(&["--lr", "0.01"]);
        let mut config = TrainConfig::default();
        args.apply(&mut config);
        assert_eq!(config.optimizer, OptimizerConfig::Adam { learning_rate: 0.01 });
    }
}
