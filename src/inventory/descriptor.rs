//! Service descriptor sheet
//!
//! A sheet is a JSON array (YAML accepted for `.yaml`/`.yml` files) of
//! descriptors, each naming one read-only operation to run in every region.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// One operation to invoke on one service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub service: String,
    pub function: String,
    /// Call parameters, expanded into path placeholders and query parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
    /// Key to extract from the response instead of returning all of it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_key: Option<String>,
}

impl ServiceDescriptor {
    /// Result key, with an empty key treated as absent
    pub fn result_key(&self) -> Option<&str> {
        self.result_key.as_deref().filter(|key| !key.is_empty())
    }
}

/// Load the descriptor sheet at `path`
pub fn load_descriptors(path: &Path) -> Result<Vec<ServiceDescriptor>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read services sheet {}", path.display()))?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    let descriptors: Vec<ServiceDescriptor> = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in services sheet {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in services sheet {}", path.display()))?
    };

    tracing::info!(
        "Loaded {} service descriptors from {}",
        descriptors.len(),
        path.display()
    );

    Ok(descriptors)
}
