use crate::data::loader::DataLoader;
use crate::error::Result;
use crate::loss::nll::NllLoss;
use crate::network::network::Network;
use crate::train::metrics::correct_predictions;

/// Outcome of a validation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Validation {
    /// Mean loss per sample.
    pub loss: f64,
    /// Top-1 accuracy, `correct / total`.
    pub accuracy: f64,
    pub correct: usize,
    pub total: usize,
}

/// Evaluates `network` on every batch of `loader` without updating it.
///
/// Dropout is disabled for the pass and the network's previous mode is
/// restored afterwards.
pub fn validation(network: &mut Network, loader: &mut DataLoader<'_>) -> Result<Validation> {
    let was_training = network.is_training();
    network.eval();
    let result = run(network, loader);
    if was_training {
        network.train();
    }
    result
}

fn run(network: &mut Network, loader: &mut DataLoader<'_>) -> Result<Validation> {
    let mut total_loss = 0.0;
    let mut correct = 0;
    let mut total = 0;

    for batch in loader.iter() {
        let log_probs = network.forward(&batch.inputs)?;
        total_loss += NllLoss::loss(&log_probs, &batch.targets)? * batch.len() as f64;
        correct += correct_predictions(&log_probs, &batch.targets);
        total += batch.len();
    }

    if total == 0 {
        return Ok(Validation { loss: 0.0, accuracy: 0.0, correct: 0, total: 0 });
    }
    Ok(Validation {
        loss: total_loss / total as f64,
        accuracy: correct as f64 / total as f64,
        correct,
        total,
    })
}
