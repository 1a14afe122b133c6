use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};

use ferrite_classifier::{
    train, validation, DataLoader, Dataset, Network, NetworkSpec, OptimizerConfig, TrainConfig,
};

/// 2x2 images: class 0 is bright on the left column, class 1 on the right.
fn left_right(samples: usize) -> Dataset {
    let mut pixels = Vec::with_capacity(samples * 4);
    let mut labels = Vec::with_capacity(samples);
    for i in 0..samples {
        let jitter = (i % 7) as u8 * 5;
        let (bright, dark) = (220 + jitter, 10 + jitter);
        let class = i % 2;
        if class == 0 {
            pixels.extend_from_slice(&[bright, dark, bright, dark]);
        } else {
            pixels.extend_from_slice(&[dark, bright, dark, bright]);
        }
        labels.push(class);
    }
    Dataset::new(pixels, labels, 2, 2, vec!["left".into(), "right".into()]).unwrap()
}

fn small_net() -> Network {
    Network::with_seed(NetworkSpec::new(4, 2, vec![8]).with_drop_p(0.0), 11).unwrap()
}

fn config(epochs: usize, print_every: usize) -> TrainConfig {
    TrainConfig {
        batch_size: 16,
        seed: Some(3),
        optimizer: OptimizerConfig::Adam { learning_rate: 0.02 },
        ..TrainConfig::new(epochs, print_every)
    }
}

#[test]
fn learns_a_separable_problem() {
    let train_set = left_right(200);
    let test_set = left_right(60);
    let mut network = small_net();
    let config = config(10, 5);

    let mut trainloader = DataLoader::new(&train_set, config.batch_size, true).unwrap().with_seed(3);
    let mut testloader = DataLoader::new(&test_set, config.batch_size, false).unwrap();
    let mut optimizer = config.optimizer.build().unwrap();

    let before = validation(&mut network, &mut testloader).unwrap();
    let reports = train(&mut network, &mut trainloader, &mut testloader, optimizer.as_mut(), &config).unwrap();

    // 13 batches per epoch, 130 steps, one report every 5 steps.
    assert_eq!(reports.len(), 26);
    assert!(reports.iter().all(|r| r.step % 5 == 0));
    assert_eq!(reports.last().unwrap().epoch, 10);

    let after = validation(&mut network, &mut testloader).unwrap();
    assert!(after.loss < before.loss, "{} !< {}", after.loss, before.loss);
    assert!(after.accuracy >= 0.95, "accuracy {}", after.accuracy);
    assert_eq!(after.total, 60);
    assert!(network.is_training());
}

#[test]
fn stop_flag_halts_before_any_step() {
    let train_set = left_right(32);
    let mut network = small_net();
    let before = network.state_dict();

    let mut config = config(3, 1);
    config.stop_flag = Some(Arc::new(AtomicBool::new(true)));

    let mut trainloader = DataLoader::new(&train_set, 8, false).unwrap();
    let mut testloader = DataLoader::new(&train_set, 8, false).unwrap();
    let mut optimizer = config.optimizer.build().unwrap();
    let reports = train(&mut network, &mut trainloader, &mut testloader, optimizer.as_mut(), &config).unwrap();

    assert!(reports.is_empty());
    assert_eq!(network.state_dict(), before);
}

#[test]
fn progress_is_streamed_until_the_receiver_goes_away() {
    let train_set = left_right(32);
    let mut trainloader = DataLoader::new(&train_set, 8, false).unwrap();
    let mut testloader = DataLoader::new(&train_set, 8, false).unwrap();

    let (tx, rx) = mpsc::channel();
    let mut streamed = config(2, 2);
    streamed.progress_tx = Some(tx);
    let mut network = small_net();
    let mut optimizer = streamed.optimizer.build().unwrap();
    let reports = train(&mut network, &mut trainloader, &mut testloader, optimizer.as_mut(), &streamed).unwrap();
    drop(streamed);

    // 4 batches per epoch over 2 epochs, reporting every 2 steps.
    let received: Vec<_> = rx.iter().collect();
    assert_eq!(received.len(), 4);
    assert_eq!(received, reports);

    let (tx, rx) = mpsc::channel();
    drop(rx);
    let mut abandoned = config(5, 1);
    abandoned.progress_tx = Some(tx);
    let mut network = small_net();
    let mut optimizer = abandoned.optimizer.build().unwrap();
    let reports = train(&mut network, &mut trainloader, &mut testloader, optimizer.as_mut(), &abandoned).unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].step, 1);
}
