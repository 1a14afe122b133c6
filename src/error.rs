//! Error types for ferrite-classifier.

use thiserror::Error;

/// Errors that can occur while building, training, or persisting a network.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid network, optimizer, or training configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A tensor did not have the shape its destination requires.
    #[error("shape mismatch for `{name}`: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Parameter or input name.
        name: String,
        /// Shape the network expects.
        expected: Vec<usize>,
        /// Shape that was supplied.
        actual: Vec<usize>,
    },

    /// A parameter the network owns is absent from the state dict.
    #[error("missing parameter `{0}` in state dict")]
    MissingParameter(String),

    /// The state dict holds a parameter the network does not own.
    #[error("unexpected parameter `{0}` in state dict")]
    UnexpectedParameter(String),

    /// Target class index outside the output range.
    #[error("target class {target} is out of range for {classes} classes")]
    InvalidTarget {
        /// Offending class index.
        target: usize,
        /// Number of output classes.
        classes: usize,
    },

    /// Malformed or inconsistent dataset.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Malformed checkpoint file.
    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    /// Misuse of a model at runtime (e.g. backward before forward).
    #[error("model error: {0}")]
    Model(String),

    /// Image decoding or encoding failure.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates a shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(name: impl Into<String>, expected: Vec<usize>, actual: Vec<usize>) -> Self {
        Self::ShapeMismatch {
            name: name.into(),
            expected,
            actual,
        }
    }

    /// Creates a dataset error.
    #[must_use]
    pub fn dataset(reason: impl Into<String>) -> Self {
        Self::Dataset(reason.into())
    }

    /// Creates a checkpoint error.
    #[must_use]
    pub fn checkpoint(reason: impl Into<String>) -> Self {
        Self::Checkpoint(reason.into())
    }

    /// Creates a model error.
    #[must_use]
    pub fn model(reason: impl Into<String>) -> Self {
        Self::Model(reason.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for ferrite-classifier operations.
pub type Result<T> = std::result::Result<T, Error>;
