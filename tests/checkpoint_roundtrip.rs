use ferrite_classifier::network::ModelMetadata;
use ferrite_classifier::{
    load_checkpoint, save_checkpoint, Checkpoint, Error, Matrix, Network, NetworkSpec,
};
use tempfile::tempdir;

fn fashion_net(hidden: Vec<usize>, seed: u64) -> Network {
    Network::with_seed(NetworkSpec::new(784, 10, hidden), seed).unwrap()
}

fn probe() -> Matrix {
    Matrix::from_vec(2, 784, (0..2 * 784).map(|i| ((i % 17) as f64 - 8.0) / 8.0).collect())
}

#[test]
fn binary_checkpoint_restores_identical_network() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("checkpoint.pth");

    let mut original = fashion_net(vec![512, 256, 128], 1);
    save_checkpoint(&original, &path).unwrap();
    let mut restored = load_checkpoint(&path).unwrap();

    assert_eq!(restored.hidden_layers(), &[512, 256, 128]);
    assert_eq!(restored.state_dict(), original.state_dict());
    assert_eq!(
        restored.predict_proba(&probe()).unwrap(),
        original.predict_proba(&probe()).unwrap()
    );
}

#[test]
fn json_checkpoint_keeps_metadata() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("checkpoint.json");

    let network = fashion_net(vec![64, 32], 2);
    let metadata = ModelMetadata::with_class_names(&ferrite_classifier::data::FASHION_MNIST_CLASSES);
    Checkpoint::from_network(&network).with_metadata(metadata.clone()).save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"hidden_layers\""));
    assert!(text.contains("\"state_dict\""));

    let checkpoint = Checkpoint::load(&path).unwrap();
    assert_eq!(checkpoint.input_size, 784);
    assert_eq!(checkpoint.output_size, 10);
    assert_eq!(checkpoint.hidden_layers, vec![64, 32]);
    assert_eq!(checkpoint.metadata, Some(metadata));
    assert_eq!(checkpoint.to_network().unwrap().state_dict(), network.state_dict());
}

#[test]
fn loading_into_different_widths_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("checkpoint.pth");
    save_checkpoint(&fashion_net(vec![512, 256, 128], 3), &path).unwrap();
    let checkpoint = Checkpoint::load(&path).unwrap();

    let mut other = fashion_net(vec![400, 200, 100], 4);
    let before = other.state_dict();

    match checkpoint.restore_into(&mut other) {
        Err(Error::ShapeMismatch { name, expected, actual }) => {
            assert_eq!(name, "hidden_layers");
            assert_eq!(expected, vec![400, 200, 100]);
            assert_eq!(actual, vec![512, 256, 128]);
        }
        other => panic!("expected a shape mismatch, got {other:?}"),
    }
    assert!(matches!(
        other.load_state_dict(&checkpoint.state_dict),
        Err(Error::ShapeMismatch { .. })
    ));
    assert_eq!(other.state_dict(), before);
}

#[test]
fn record_disagreeing_with_its_parameters_is_rejected() {
    let mut checkpoint = Checkpoint::from_network(&fashion_net(vec![32], 5));
    checkpoint.hidden_layers = vec![16];
    assert!(matches!(checkpoint.to_network(), Err(Error::ShapeMismatch { .. })));

    let mut extra_layer = Checkpoint::from_network(&fashion_net(vec![32], 5));
    extra_layer.hidden_layers = vec![32, 32];
    assert!(matches!(extra_layer.to_network(), Err(Error::MissingParameter(_))));
}

#[test]
fn absurd_recorded_width_is_an_error_not_a_crash() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hostile.json");

    let mut checkpoint = Checkpoint::from_network(&fashion_net(vec![32], 6));
    checkpoint.hidden_layers = vec![usize::MAX / 2];
    checkpoint.save(&path).unwrap();

    let loaded = Checkpoint::load(&path).unwrap();
    match loaded.to_network() {
        Err(Error::ShapeMismatch { name, .. }) => assert_eq!(name, "hidden_layers.0.weight"),
        other => panic!("expected a shape mismatch, got {other:?}"),
    }
    assert!(load_checkpoint(&path).is_err());
}

#[test]
fn garbage_file_is_not_a_checkpoint() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bogus.pth");
    std::fs::write(&path, b"definitely not a model").unwrap();
    assert!(matches!(Checkpoint::load(&path), Err(Error::Checkpoint(_))));

    let missing = dir.path().join("missing.pth");
    assert!(matches!(load_checkpoint(&missing), Err(Error::Checkpoint(_))));
}
