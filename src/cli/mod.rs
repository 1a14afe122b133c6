pub mod commands;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use ferrite_classifier::network::ModelMetadata;
use ferrite_classifier::train::top_k;
use ferrite_classifier::view::{format_probabilities, image_to_input, view_classify};
use ferrite_classifier::{
    train, validation, Checkpoint, DataLoader, Dataset, Matrix, Network, NetworkSpec, Normalize, Optimizer,
    Split, TrainConfig,
};

use commands::{Commands, DataArgs, DatasetKind, EvaluateArgs, InspectArgs, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(name = "ferrite-classifier")]
#[command(about = "Train, evaluate and query fully-connected image classifiers")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Predict(args) => run_predict(args),
            Commands::Inspect(args) => run_inspect(args),
        }
    }
}

fn load_split(data: &DataArgs, split: Split) -> Result<Dataset> {
    let dataset = match data.dataset {
        DatasetKind::FashionMnist => Dataset::fashion_mnist(&data.data_dir, split),
        DatasetKind::Mnist => Dataset::mnist(&data.data_dir, split),
    }
    .with_context(|| format!("failed to load {split:?} split from {}", data.data_dir.display()))?;

    Ok(match data.limit {
        Some(n) => dataset.take(n),
        None => dataset,
    })
}

fn load(path: &std::path::Path) -> Result<Checkpoint> {
    Checkpoint::load(path).with_context(|| format!("failed to load checkpoint {}", path.display()))
}

fn run_train(args: TrainArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => TrainConfig::load_json(path)
            .with_context(|| format!("failed to read training config {}", path.display()))?,
        None => TrainConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;

    let train_set = load_split(&args.data, Split::Train)?;
    let test_set = load_split(&args.data, Split::Test)?;

    let spec = NetworkSpec::new(train_set.input_size(), train_set.num_classes(), args.hidden.clone())
        .with_drop_p(args.drop_p)
        .with_activation(args.activation);
    let mut network = match config.seed {
        Some(seed) => Network::with_seed(spec, seed)?,
        None => Network::new(spec)?,
    };
    println!("{network}");

    let mut trainloader = DataLoader::new(&train_set, config.batch_size, config.shuffle)?;
    if let Some(seed) = config.seed {
        trainloader = trainloader.with_seed(seed);
    }
    let mut testloader = DataLoader::new(&test_set, config.batch_size, false)?;
    let mut optimizer = config.optimizer.build()?;

    let reports = train(&mut network, &mut trainloader, &mut testloader, optimizer.as_mut(), &config)?;
    for progress in &reports {
        println!("{progress}");
    }

    let result = validation(&mut network, &mut testloader)?;
    println!(
        "Final test loss: {:.3}.. Test accuracy: {:.3} ({}/{})",
        result.loss, result.accuracy, result.correct, result.total
    );

    let metadata = ModelMetadata {
        description: Some(format!(
            "{:?} classifier, {} epochs with {}",
            args.data.dataset,
            config.epochs,
            optimizer.name()
        )),
        class_names: Some(train_set.class_names().to_vec()),
    };
    Checkpoint::from_network(&network)
        .with_metadata(metadata)
        .save(&args.output)
        .with_context(|| format!("failed to save checkpoint {}", args.output.display()))?;
    info!("saved checkpoint to {}", args.output.display());
    println!("Saved checkpoint to {}", args.output.display());
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    let checkpoint = load(&args.checkpoint)?;
    let mut network = checkpoint.to_network()?;
    let test_set = load_split(&args.data, Split::Test)?;
    if test_set.input_size() != network.spec().input_size {
        bail!(
            "checkpoint expects {} inputs but the dataset has {}x{} images",
            network.spec().input_size,
            test_set.rows(),
            test_set.cols()
        );
    }

    let mut testloader = DataLoader::new(&test_set, args.batch_size, false)?;
    let result = validation(&mut network, &mut testloader)?;
    println!(
        "Test loss: {:.3}.. Test accuracy: {:.3} ({}/{})",
        result.loss, result.accuracy, result.correct, result.total
    );
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let checkpoint = load(&args.checkpoint)?;
    let mut network = checkpoint.to_network()?;
    let input_size = network.spec().input_size;
    let normalize = Normalize::default();

    let (pixels, rows, cols, label, dataset_names) = match &args.image {
        Some(path) => {
            let side = (input_size as f64).sqrt().round() as usize;
            if side * side != input_size {
                bail!("checkpoint input size {input_size} is not a square image");
            }
            let pixels = image_to_input(path, side as u32, side as u32, normalize)
                .with_context(|| format!("failed to read image {}", path.display()))?;
            (pixels, side, side, None, None)
        }
        None => {
            let test_set = load_split(&args.data, Split::Test)?;
            if args.index >= test_set.len() {
                bail!("index {} out of range for {} test samples", args.index, test_set.len());
            }
            let (raw, label) = test_set.get(args.index);
            let pixels: Vec<f64> = raw.iter().map(|&p| normalize.apply(p)).collect();
            (
                pixels,
                test_set.rows(),
                test_set.cols(),
                Some(label),
                Some(test_set.class_names().to_vec()),
            )
        }
    };
    if pixels.len() != input_size {
        bail!("checkpoint expects {input_size} inputs, got {}", pixels.len());
    }

    let metadata = checkpoint.metadata.clone().unwrap_or_default();
    let class_names: Vec<String> = match (&metadata.class_names, dataset_names) {
        (Some(names), _) => names.clone(),
        (None, Some(names)) => names,
        (None, None) => (0..network.spec().output_size).map(|c| c.to_string()).collect(),
    };

    let input = Matrix::from_vec(1, input_size, pixels.clone());
    let probs = network.predict_proba(&input)?;
    let probs = probs.row(0);

    println!("{}", format_probabilities(probs, &class_names));
    println!();
    for (rank, (class, p)) in top_k(probs, args.top_k).into_iter().enumerate() {
        println!("{:>2}. {} ({:.4})", rank + 1, class_label(&class_names, class), p);
    }
    if let Some(label) = label {
        println!("True label: {}", class_label(&class_names, label));
    }

    if let Some(plot) = &args.plot {
        view_classify(&pixels, rows, cols, normalize, probs, plot)
            .with_context(|| format!("failed to write {}", plot.display()))?;
        println!("Wrote {}", plot.display());
    }
    Ok(())
}

fn class_label(class_names: &[String], class: usize) -> String {
    class_names.get(class).cloned().unwrap_or_else(|| class.to_string())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let checkpoint = load(&args.checkpoint)?;
    let network = checkpoint.to_network()?;

    println!("{network}");
    println!("input_size:    {}", checkpoint.input_size);
    println!("output_size:   {}", checkpoint.output_size);
    println!("hidden_layers: {:?}", checkpoint.hidden_layers);
    println!("drop_p:        {}", checkpoint.drop_p);
    println!("activation:    {}", checkpoint.activation);
    if let Some(metadata) = &checkpoint.metadata {
        if let Some(description) = &metadata.description {
            println!("description:   {description}");
        }
        if let Some(names) = &metadata.class_names {
            println!("classes:       {}", names.join(", "));
        }
    }
    println!();
    for (name, tensor) in checkpoint.state_dict.iter() {
        println!("{name:<24} {:?}", tensor.shape);
    }
    println!("parameters:    {}", network.num_parameters());
    Ok(())
}
