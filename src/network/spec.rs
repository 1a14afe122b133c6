use serde::{Deserialize, Serialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};

fn default_drop_p() -> f64 {
    0.5
}

/// Architecture of a fully-connected classifier.
///
/// Fields:
/// - `input_size`:    features per sample (784 for 28×28 images)
/// - `output_size`:   number of classes
/// - `hidden_layers`: widths of the hidden layers, input → output order
/// - `drop_p`:        dropout probability after every hidden layer
/// - `activation`:    non-linearity after every hidden layer
///
/// `NetworkSpec` can be saved to / loaded from JSON independently of the
/// trained weights, so an architecture can be stored before training starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub input_size: usize,
    pub output_size: usize,
    pub hidden_layers: Vec<usize>,
    #[serde(default = "default_drop_p")]
    pub drop_p: f64,
    #[serde(default)]
    pub activation: ActivationFunction,
}

impl NetworkSpec {
    /// Spec with the default dropout (0.5) and ReLU activation.
    pub fn new(input_size: usize, output_size: usize, hidden_layers: Vec<usize>) -> Self {
        NetworkSpec {
            input_size,
            output_size,
            hidden_layers,
            drop_p: default_drop_p(),
            activation: ActivationFunction::default(),
        }
    }

    pub fn with_drop_p(mut self, drop_p: f64) -> Self {
        self.drop_p = drop_p;
        self
    }

    pub fn with_activation(mut self, activation: ActivationFunction) -> Self {
        self.activation = activation;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(Error::invalid_config("input_size must be > 0"));
        }
        if self.output_size == 0 {
            return Err(Error::invalid_config("output_size must be > 0"));
        }
        if self.hidden_layers.is_empty() {
            return Err(Error::invalid_config("at least one hidden layer is required"));
        }
        if let Some(i) = self.hidden_layers.iter().position(|&w| w == 0) {
            return Err(Error::invalid_config(format!("hidden layer {i} has width 0")));
        }
        if !(0.0..1.0).contains(&self.drop_p) {
            return Err(Error::invalid_config(format!(
                "drop_p must be in [0, 1), got {}",
                self.drop_p
            )));
        }
        Ok(())
    }

    /// All layer widths, input and output included.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden_layers.len() + 2);
        sizes.push(self.input_size);
        sizes.extend_from_slice(&self.hidden_layers);
        sizes.push(self.output_size);
        sizes
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes and validates a `NetworkSpec` from a JSON file.
    pub fn load_json(path: impl AsRef<std::path::Path>) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let spec: NetworkSpec = serde_json::from_reader(reader)?;
        spec.validate()?;
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_layer_sizes() {
        let spec = NetworkSpec::new(784, 10, vec![512, 256, 128]);
        assert_eq!(spec.drop_p, 0.5);
        assert_eq!(spec.activation, ActivationFunction::ReLU);
        assert_eq!(spec.layer_sizes(), vec![784, 512, 256, 128, 10]);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn validation_rejects_degenerate_specs() {
        assert!(NetworkSpec::new(0, 10, vec![4]).validate().is_err());
        assert!(NetworkSpec::new(4, 0, vec![4]).validate().is_err());
        assert!(NetworkSpec::new(4, 2, vec![]).validate().is_err());
        assert!(NetworkSpec::new(4, 2, vec![3, 0]).validate().is_err());
        assert!(NetworkSpec::new(4, 2, vec![3]).with_drop_p(1.0).validate().is_err());
    }

    #[test]
    fn json_fills_optional_fields() {
        let json = r#"{"input_size": 4, "output_size": 3, "hidden_layers": [8]}"#;
        let spec: NetworkSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec, NetworkSpec::new(4, 3, vec![8]));
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spec.json");
        let spec = NetworkSpec::new(784, 10, vec![256])
            .with_drop_p(0.2)
            .with_activation(ActivationFunction::Tanh);
        spec.save_json(&path).unwrap();
        assert_eq!(NetworkSpec::load_json(&path).unwrap(), spec);
    }
}
