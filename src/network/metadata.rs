use serde::{Deserialize, Serialize};

/// Optional annotations attached to a saved network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    pub description: Option<String>,
    /// Human-readable class labels for the output layer (e.g. "T-shirt/top").
    pub class_names: Option<Vec<String>>,
}

impl ModelMetadata {
    pub fn with_class_names(class_names: &[&str]) -> Self {
        ModelMetadata {
            description: None,
            class_names: Some(class_names.iter().map(|s| s.to_string()).collect()),
        }
    }

    /// Label for `class`, falling back to its index.
    pub fn class_name(&self, class: usize) -> String {
        self.class_names
            .as_ref()
            .and_then(|names| names.get(class))
            .cloned()
            .unwrap_or_else(|| class.to_string())
    }
}
