use std::path::Path;

use serde::{Deserialize, Serialize};

/// Supported checkpoint file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckpointFormat {
    /// Compact `bincode` payload behind a magic header.
    #[default]
    Binary,

    /// Pretty-printed JSON, for inspection and diffing.
    Json,
}

impl CheckpointFormat {
    /// `.json` → Json, anything else (`.pth`, `.bin`, no extension) → Binary.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Self::Json,
            _ => Self::Binary,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for CheckpointFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
