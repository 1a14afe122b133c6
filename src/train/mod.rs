pub mod loop_fn;
pub mod metrics;
pub mod progress;
pub mod train_config;
pub mod trainer;
pub mod validate;

pub use loop_fn::train;
pub use metrics::{accuracy, correct_predictions, top_k};
pub use progress::TrainingProgress;
pub use train_config::TrainConfig;
pub use trainer::train_step;
pub use validate::{validation, Validation};
