use crate::data::loader::Batch;
use crate::error::Result;
use crate::loss::nll::NllLoss;
use crate::network::network::Network;
use crate::optim::Optimizer;

/// One optimisation step on `batch`: clear gradients, forward, loss,
/// backward, update. Returns the batch loss before the update.
pub fn train_step(network: &mut Network, batch: &Batch, optimizer: &mut dyn Optimizer) -> Result<f64> {
    network.zero_grad();

    let log_probs = network.forward(&batch.inputs)?;
    let loss = NllLoss::loss(&log_probs, &batch.targets)?;

    let grad = NllLoss::derivative(&log_probs, &batch.targets)?;
    network.backward(&grad)?;

    optimizer.step(network.parameters_mut())?;
    Ok(loss)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::matrix::Matrix;
    use crate::network::spec::NetworkSpec;
    use crate::optim::sgd::Sgd;

    #[test]
    fn repeated_steps_reduce_loss_on_one_batch() {
        let spec = NetworkSpec::new(3, 2, vec![8]).with_drop_p(0.0);
        let mut net = Network::with_seed(spec, 4).unwrap();
        let batch = Batch {
            inputs: Matrix::from_vec(2, 3, vec![1.0, 0.0, -1.0, -1.0, 0.0, 1.0]),
            targets: vec![0, 1],
        };
        let mut sgd = Sgd::new(0.5).unwrap();

        let first = train_step(&mut net, &batch, &mut sgd).unwrap();
        let mut last = first;
        for _ in 0..100 {
            last = train_step(&mut net, &batch, &mut sgd).unwrap();
        }
        assert!(last < first * 0.1, "loss went from {first} to {last}");
    }

    #[test]
    fn invalid_targets_leave_parameters_untouched() {
        let spec = NetworkSpec::new(3, 2, vec![4]);
        let mut net = Network::with_seed(spec, 4).unwrap();
        let before = net.state_dict();
        let batch = Batch {
            inputs: Matrix::zeros(1, 3),
            targets: vec![5],
        };
        let mut sgd = Sgd::new(0.1).unwrap();
        assert!(train_step(&mut net, &batch, &mut sgd).is_err());
        assert_eq!(net.state_dict(), before);
    }
}
