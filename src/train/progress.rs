use serde::{Deserialize, Serialize};

/// One periodic training report, emitted every `print_every` steps.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, the training
/// loop sends one `TrainingProgress` value per report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingProgress {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Global optimizer step count so far.
    pub step: usize,
    /// Mean training loss over the steps since the previous report.
    pub train_loss: f64,
    /// Mean validation loss per sample.
    pub test_loss: f64,
    /// Top-1 validation accuracy in [0, 1].
    pub test_accuracy: f64,
    /// Wall-clock time since training started, in milliseconds.
    pub elapsed_ms: u64,
}

impl std::fmt::Display for TrainingProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Epoch: {}/{}.. Training Loss: {:.3}.. Test Loss: {:.3}.. Test Accuracy: {:.3}",
            self.epoch, self.total_epochs, self.train_loss, self.test_loss, self.test_accuracy
        )
    }
}
