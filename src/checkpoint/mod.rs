//! Checkpoint persistence: architecture metadata plus learned parameters.

pub mod format;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bincode::Options;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::network::metadata::ModelMetadata;
use crate::network::network::Network;
use crate::network::spec::NetworkSpec;
use crate::network::state_dict::StateDict;

pub use format::CheckpointFormat;

const MAGIC: &[u8; 4] = b"FCKP";
const VERSION: u32 = 1;

fn default_drop_p() -> f64 {
    0.5
}

/// Everything needed to rebuild a trained network.
///
/// The hidden widths must match the network the parameters are loaded
/// into exactly; any difference fails the load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub input_size: usize,
    pub output_size: usize,
    pub hidden_layers: Vec<usize>,
    #[serde(default = "default_drop_p")]
    pub drop_p: f64,
    #[serde(default)]
    pub activation: ActivationFunction,
    pub state_dict: StateDict,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl Checkpoint {
    /// Captures the architecture and current parameters of `network`.
    pub fn from_network(network: &Network) -> Checkpoint {
        let spec = network.spec();
        Checkpoint {
            input_size: spec.input_size,
            output_size: spec.output_size,
            hidden_layers: spec.hidden_layers.clone(),
            drop_p: spec.drop_p,
            activation: spec.activation,
            state_dict: network.state_dict(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Checkpoint {
        self.metadata = Some(metadata);
        self
    }

    /// Architecture recorded in the checkpoint.
    pub fn spec(&self) -> NetworkSpec {
        NetworkSpec {
            input_size: self.input_size,
            output_size: self.output_size,
            hidden_layers: self.hidden_layers.clone(),
            drop_p: self.drop_p,
            activation: self.activation,
        }
    }

    /// Builds a network of the recorded shape and loads the stored
    /// parameters into it.
    ///
    /// The stored tensors are checked against the recorded widths before
    /// any layer is allocated.
    pub fn to_network(&self) -> Result<Network> {
        self.check_parameters()?;
        let mut network = Network::new(self.spec())?;
        network.load_state_dict(&self.state_dict)?;
        Ok(network)
    }

    /// Every layer the recorded architecture implies must be present in the
    /// state dict with exactly the implied shape and element count.
    fn check_parameters(&self) -> Result<()> {
        let spec = self.spec();
        spec.validate()?;

        let sizes = spec.layer_sizes();
        let last = sizes.len() - 2;
        let mut expected = Vec::with_capacity(2 * (last + 1));
        for (i, pair) in sizes.windows(2).enumerate() {
            let prefix = if i == last { "output".to_string() } else { format!("hidden_layers.{i}") };
            expected.push((format!("{prefix}.weight"), vec![pair[0], pair[1]]));
            expected.push((format!("{prefix}.bias"), vec![1, pair[1]]));
        }

        for (name, shape) in &expected {
            let tensor = self
                .state_dict
                .get(name)
                .ok_or_else(|| Error::MissingParameter(name.clone()))?;
            if &tensor.shape != shape {
                return Err(Error::shape_mismatch(name.clone(), shape.clone(), tensor.shape.clone()));
            }
            if tensor.data.len() != tensor.numel() {
                return Err(Error::checkpoint(format!(
                    "`{name}` declares shape {:?} but holds {} values",
                    tensor.shape,
                    tensor.data.len()
                )));
            }
        }
        if let Some(extra) = self
            .state_dict
            .keys()
            .find(|k| !expected.iter().any(|(name, _)| name == *k))
        {
            return Err(Error::UnexpectedParameter(extra.clone()));
        }
        Ok(())
    }

    /// Loads the stored parameters into an existing network whose
    /// architecture must equal the recorded one.
    pub fn restore_into(&self, network: &mut Network) -> Result<()> {
        let spec = network.spec();
        if spec.input_size != self.input_size {
            return Err(Error::shape_mismatch(
                "input_size",
                vec![spec.input_size],
                vec![self.input_size],
            ));
        }
        if spec.hidden_layers != self.hidden_layers {
            return Err(Error::shape_mismatch(
                "hidden_layers",
                spec.hidden_layers.clone(),
                self.hidden_layers.clone(),
            ));
        }
        if spec.output_size != self.output_size {
            return Err(Error::shape_mismatch(
                "output_size",
                vec![spec.output_size],
                vec![self.output_size],
            ));
        }
        network.load_state_dict(&self.state_dict)
    }

    /// Writes the checkpoint, choosing the format from the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.save_as(path, CheckpointFormat::from_path(path))
    }

    pub fn save_as(&self, path: impl AsRef<Path>, format: CheckpointFormat) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);

        match format {
            CheckpointFormat::Binary => {
                writer.write_all(MAGIC)?;
                writer.write_all(&VERSION.to_le_bytes())?;
                bincode::serialize_into(&mut writer, self)?;
            }
            CheckpointFormat::Json => serde_json::to_writer_pretty(&mut writer, self)?,
        }
        writer.flush()?;

        debug!(
            path = %path.display(),
            format = %format,
            parameters = self.state_dict.num_parameters(),
            "saved checkpoint"
        );
        Ok(())
    }

    /// Reads a checkpoint, choosing the format from the file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Checkpoint> {
        let path = path.as_ref();
        let format = CheckpointFormat::from_path(path);
        let file = File::open(path)
            .map_err(|e| Error::checkpoint(format!("cannot open {}: {e}", path.display())))?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let checkpoint: Checkpoint = match format {
            CheckpointFormat::Binary => {
                let mut header = [0u8; 8];
                reader.read_exact(&mut header).map_err(|_| {
                    Error::checkpoint(format!("{} is too short to be a checkpoint", path.display()))
                })?;
                if &header[..4] != MAGIC {
                    return Err(Error::checkpoint(format!(
                        "{} is not a checkpoint (bad magic)",
                        path.display()
                    )));
                }
                let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
                if version != VERSION {
                    return Err(Error::checkpoint(format!(
                        "unsupported checkpoint version {version} (expected {VERSION})"
                    )));
                }
                // Length prefixes can never exceed what the file holds.
                bincode::DefaultOptions::new()
                    .with_fixint_encoding()
                    .allow_trailing_bytes()
                    .with_limit(file_len)
                    .deserialize_from(reader)?
            }
            CheckpointFormat::Json => serde_json::from_reader(reader)?,
        };

        debug!(
            path = %path.display(),
            format = %format,
            hidden_layers = ?checkpoint.hidden_layers,
            "loaded checkpoint"
        );
        Ok(checkpoint)
    }
}

/// Saves `network` to `path` (format chosen from the extension).
pub fn save_checkpoint(network: &Network, path: impl AsRef<Path>) -> Result<()> {
    Checkpoint::from_network(network).save(path)
}

/// Reads `path` and rebuilds the network it describes.
pub fn load_checkpoint(path: impl AsRef<Path>) -> Result<Network> {
    Checkpoint::load(path)?.to_network()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> Network {
        Network::with_seed(NetworkSpec::new(6, 3, vec![5, 4]).with_drop_p(0.2), 12).unwrap()
    }

    #[test]
    fn spec_round_trips_through_record() {
        let net = network();
        let ckpt = Checkpoint::from_network(&net);
        assert_eq!(&ckpt.spec(), net.spec());
        assert_eq!(ckpt.hidden_layers, vec![5, 4]);
    }

    #[test]
    fn binary_file_has_magic_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.pth");
        save_checkpoint(&network(), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], MAGIC);
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), VERSION);
    }

    #[test]
    fn rejects_foreign_and_future_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.pth");
        std::fs::write(&path, b"PK\x03\x04garbage").unwrap();
        assert!(matches!(Checkpoint::load(&path), Err(Error::Checkpoint(_))));

        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&99u32.to_le_bytes());
        std::fs::write(&path, bytes).unwrap();
        let err = Checkpoint::load(&path).unwrap_err();
        assert!(err.to_string().contains("version 99"));

        std::fs::write(&path, b"FC").unwrap();
        assert!(Checkpoint::load(&path).is_err());
    }

    #[test]
    fn oversized_length_prefix_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("truncated.pth");

        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&VERSION.to_le_bytes());
        bytes.extend_from_slice(&784u64.to_le_bytes()); // input_size
        bytes.extend_from_slice(&10u64.to_le_bytes()); // output_size
        bytes.extend_from_slice(&1u64.to_le_bytes()); // hidden_layers len
        bytes.extend_from_slice(&8u64.to_le_bytes());
        bytes.extend_from_slice(&0.5f64.to_le_bytes()); // drop_p
        bytes.extend_from_slice(&0u32.to_le_bytes()); // activation
        bytes.extend_from_slice(&1u64.to_le_bytes()); // state_dict len
        bytes.extend_from_slice(&(1u64 << 62).to_le_bytes()); // key len
        bytes.extend_from_slice(b"abc");
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(Checkpoint::load(&path), Err(Error::Serialization(_))));
    }

    #[test]
    fn binary_body_still_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.bin");
        let ckpt = Checkpoint::from_network(&network())
            .with_metadata(ModelMetadata::with_class_names(&["a", "b", "c"]));
        ckpt.save(&path).unwrap();
        assert_eq!(Checkpoint::load(&path).unwrap(), ckpt);
    }

    #[test]
    fn huge_recorded_widths_fail_before_allocating() {
        let mut ckpt = Checkpoint::from_network(&network());
        ckpt.hidden_layers = vec![usize::MAX / 2, 4];
        assert!(matches!(ckpt.to_network(), Err(Error::ShapeMismatch { .. })));

        // A matching shape with too few values is also caught up front.
        let mut lying = Checkpoint::from_network(&network());
        lying.hidden_layers = vec![usize::MAX / 2, 4];
        if let Some(t) = lying.state_dict.get_mut("hidden_layers.0.weight") {
            t.shape = vec![6, usize::MAX / 2];
        }
        assert!(lying.to_network().is_err());
    }

    #[test]
    fn missing_file_is_a_checkpoint_error() {
        let err = Checkpoint::load("/definitely/not/here.pth").unwrap_err();
        assert!(matches!(err, Error::Checkpoint(_)));
    }

    #[test]
    fn restore_into_checks_architecture_first() {
        let ckpt = Checkpoint::from_network(&network());
        let mut wider = Network::with_seed(NetworkSpec::new(6, 3, vec![5, 8]), 1).unwrap();
        match ckpt.restore_into(&mut wider) {
            Err(Error::ShapeMismatch { name, expected, actual }) => {
                assert_eq!(name, "hidden_layers");
                assert_eq!(expected, vec![5, 8]);
                assert_eq!(actual, vec![5, 4]);
            }
            other => panic!("expected shape mismatch, got {other:?}"),
        }

        let mut other_input = Network::with_seed(NetworkSpec::new(7, 3, vec![5, 4]), 1).unwrap();
        assert!(ckpt.restore_into(&mut other_input).is_err());
    }

    #[test]
    fn metadata_survives_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.json");
        let ckpt = Checkpoint::from_network(&network())
            .with_metadata(ModelMetadata::with_class_names(&["a", "b", "c"]));
        ckpt.save(&path).unwrap();
        let loaded = Checkpoint::load(&path).unwrap();
        assert_eq!(loaded.metadata.unwrap().class_name(2), "c");
    }
}
