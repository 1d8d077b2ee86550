//! Configuration Management
//!
//! Optional JSON configuration for gcp-inventory, read from `--config` or
//! from the user config directory.

use crate::gcp::client::DEFAULT_USER_AGENT;
use crate::inventory::MetadataStripping;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Project to inventory
    #[serde(default)]
    pub project_id: Option<String>,
    /// Only inventory these regions
    #[serde(default)]
    pub regions: Option<Vec<String>>,
    /// Record successful calls with an empty payload
    #[serde(default)]
    pub keep_empty: bool,
    #[serde(default)]
    pub metadata_stripping: MetadataStripping,
    /// Pretty-print the output document
    #[serde(default)]
    pub pretty: bool,
    /// Base URL replacing every Google API host
    #[serde(default)]
    pub endpoint_override: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gcp-inventory").join("config.json"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist and parse. The default path is optional:
    /// a missing file gives defaults, a malformed one is reported and ignored.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let Some(path) = Self::default_path() else {
            return Ok(Self::default());
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        match Self::load_from(&path) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("Ignoring config file {}: {:#}", path.display(), e);
                Ok(Self::default())
            },
        }
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Get effective project (CLI > config > environment/gcloud default)
    pub fn effective_project(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string)
            .or_else(|| self.project_id.clone())
            .or_else(crate::gcp::auth::get_default_project)
    }

    /// Get effective User-Agent
    pub fn effective_user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"project_id": "inventory-prod"}"#).unwrap();
        assert_eq!(config.project_id.as_deref(), Some("inventory-prod"));
        assert!(!config.keep_empty);
        assert_eq!(config.metadata_stripping, MetadataStripping::Always);
        assert_eq!(config.effective_user_agent(), DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_full_config() {
        let config: Config = serde_json::from_str(
            r#"{
                "regions": ["us-central1", "europe-west1"],
                "keep_empty": true,
                "metadata_stripping": "unparameterized",
                "pretty": true,
                "endpoint_override": "http://localhost:8085",
                "user_agent": "audit-bot/2.0"
            }"#,
        )
        .unwrap();
        assert_eq!(config.regions.as_ref().unwrap().len(), 2);
        assert_eq!(config.metadata_stripping, MetadataStripping::Unparameterized);
        assert_eq!(config.effective_user_agent(), "audit-bot/2.0");
    }

    #[test]
    fn test_cli_project_wins() {
        let config = Config {
            project_id: Some("from-config".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.effective_project(Some("from-cli")).as_deref(),
            Some("from-cli")
        );
        assert_eq!(config.effective_project(None).as_deref(), Some("from-config"));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let err = Config::load(Some(Path::new("/nonexistent/config.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_explicit_malformed_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
