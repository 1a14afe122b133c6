use std::sync::atomic::Ordering;
use std::time::Instant;

use tracing::{debug, info};

use crate::data::loader::DataLoader;
use crate::error::Result;
use crate::network::network::Network;
use crate::optim::Optimizer;
use crate::train::progress::TrainingProgress;
use crate::train::train_config::TrainConfig;
use crate::train::trainer::train_step;
use crate::train::validate::validation;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` for `config.epochs` epochs and returns every report
/// produced along the way.
///
/// Every `config.print_every` optimizer steps the network is switched to
/// eval mode, validated on `testloader`, logged, and switched back to
/// training mode. The reported training loss is the mean batch loss since
/// the previous report.
///
/// # Early termination
/// The loop stops before the next batch if:
/// - the `progress_tx` receiver has been dropped, **or**
/// - `config.stop_flag` is set to `true`.
///
/// # Errors
/// Returns `Error::InvalidConfig` for a bad config and propagates any model
/// error (e.g. a dataset whose images do not match the input size).
pub fn train(
    network: &mut Network,
    trainloader: &mut DataLoader<'_>,
    testloader: &mut DataLoader<'_>,
    optimizer: &mut dyn Optimizer,
    config: &TrainConfig,
) -> Result<Vec<TrainingProgress>> {
    config.validate()?;

    let started = Instant::now();
    let mut reports = Vec::new();
    let mut steps = 0usize;
    let mut running_loss = 0.0;
    let mut running_steps = 0usize;

    info!(
        network = %network,
        optimizer = optimizer.name(),
        learning_rate = optimizer.learning_rate(),
        epochs = config.epochs,
        batches_per_epoch = trainloader.len(),
        "starting training"
    );

    'epochs: for epoch in 1..=config.epochs {
        network.train();

        for batch in trainloader.iter() {
            if stop_requested(config) {
                info!(epoch, steps, "training stopped on request");
                break 'epochs;
            }

            steps += 1;
            running_loss += train_step(network, &batch, optimizer)?;
            running_steps += 1;

            if steps % config.print_every == 0 {
                let progress = report(
                    network,
                    testloader,
                    epoch,
                    config.epochs,
                    steps,
                    running_loss / running_steps as f64,
                    &started,
                )?;
                running_loss = 0.0;
                running_steps = 0;

                if let Some(ref tx) = config.progress_tx {
                    if tx.send(progress.clone()).is_err() {
                        reports.push(progress);
                        info!(epoch, steps, "progress receiver dropped; stopping training");
                        break 'epochs;
                    }
                }
                reports.push(progress);
            }
        }

        debug!(epoch, steps, "epoch complete");
    }

    network.train();
    Ok(reports)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn stop_requested(config: &TrainConfig) -> bool {
    config
        .stop_flag
        .as_ref()
        .map(|flag| flag.load(Ordering::Relaxed))
        .unwrap_or(false)
}

/// Validates, logs, and packages one progress report.
fn report(
    network: &mut Network,
    testloader: &mut DataLoader<'_>,
    epoch: usize,
    total_epochs: usize,
    step: usize,
    train_loss: f64,
    started: &Instant,
) -> Result<TrainingProgress> {
    let result = validation(network, testloader)?;

    let progress = TrainingProgress {
        epoch,
        total_epochs,
        step,
        train_loss,
        test_loss: result.loss,
        test_accuracy: result.accuracy,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    info!("{progress}");
    Ok(progress)
}
