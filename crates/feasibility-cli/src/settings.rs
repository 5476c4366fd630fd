//! Configuration file for the CLI.
//!
//! ```yaml
//! assessment:
//!   uncertainty_threshold: { absolute: 2.0 }
//!   baseline: { eta_min: 2, eta_max: 4 }
//! narrative:
//!   model: gemini-1.5-flash
//!   attempt_timeout: 60s
//!   max_attempts: 3
//! provider:
//!   type: gemini
//!   config: { base_url: "https://generativelanguage.googleapis.com/v1beta" }
//! store: ~/.feasibility/history.json
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fs;
use std::path::{Path, PathBuf};

use feasibility_core::AssessmentConfig;
use feasibility_runtime::NarrativeConfig;

/// History file used when neither `--store` nor the config names one.
pub const DEFAULT_STORE_PATH: &str = "feasibility-history.json";

/// Which provider writes narrative plans, and its settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub config: JsonValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub assessment: AssessmentConfig,
    pub narrative: NarrativeConfig,

    /// No plans are requested when absent
    pub provider: Option<ProviderSettings>,

    pub store: Option<PathBuf>,
}

impl AppConfig {
    /// Load from YAML (`.yaml`/`.yml`) or JSON, or use defaults without a path.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)
                .with_context(|| format!("Invalid YAML in {}", path.display()))?,
            _ => serde_json::from_str(&contents)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        };

        config
            .assessment
            .validate()
            .context("Invalid assessment settings")?;
        config
            .narrative
            .validate()
            .context("Invalid narrative settings")?;
        Ok(config)
    }

    /// `--store` first, then the config file, then the default.
    pub fn store_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.store.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults_without_file() {
        let config = AppConfig::load(None).unwrap();
        assert!(config.provider.is_none());
        assert_eq!(config.store_path(None), PathBuf::from(DEFAULT_STORE_PATH));
    }

    #[test]
    fn test_load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feasibility.yaml");
        fs::write(
            &path,
            "narrative:\n  attempt_timeout: 30s\nprovider:\n  type: gemini\n  config:\n    api_key: test\nstore: saved.json\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.narrative.attempt_timeout, Duration::from_secs(30));
        assert_eq!(config.narrative.max_attempts, 3);

        let provider = config.provider.as_ref().unwrap();
        assert_eq!(provider.kind, "gemini");
        assert_eq!(provider.config["api_key"], "test");

        assert_eq!(config.store_path(None), PathBuf::from("saved.json"));
        assert_eq!(
            config.store_path(Some(Path::new("flag.json"))),
            PathBuf::from("flag.json")
        );
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feasibility.json");
        fs::write(&path, r#"{ "narrative": { "max_attempts": 0 } }"#).unwrap();

        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(AppConfig::load(Some(Path::new("/nonexistent/feasibility.yaml"))).is_err());
    }
}
