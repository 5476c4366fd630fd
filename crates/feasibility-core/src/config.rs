//! Assessment configuration: the uncertainty threshold and the baseline
//! report every assessment starts from.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::engine::UncertaintyThreshold;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Starting values of every assembled report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Baseline {
    pub eta_min: u32,
    pub eta_max: u32,
    pub risk: String,
    pub confidence: String,
    pub summary: String,
    pub scope_title: String,
}

impl Default for Baseline {
    fn default() -> Self {
        Self {
            eta_min: 2,
            eta_max: 4,
            risk: "Medium".to_string(),
            confidence: "Medium".to_string(),
            summary: "Based on your responses, here's our assessment:".to_string(),
            scope_title: "Project".to_string(),
        }
    }
}

/// Knobs of the rule-based assessment.
///
/// ```yaml
/// uncertainty_threshold:
///   absolute: 2.0
/// baseline:
///   eta_min: 3
///   eta_max: 6
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentConfig {
    pub uncertainty_threshold: UncertaintyThreshold,
    pub baseline: Baseline,
}

impl AssessmentConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, YAML for `.yaml`/`.yml` and JSON otherwise.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&contents),
            _ => Self::from_json(&contents),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let value = match self.uncertainty_threshold {
            UncertaintyThreshold::Absolute(v) | UncertaintyThreshold::ShareOfQuestions(v) => v,
        };
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "uncertainty threshold must be a non-negative number, got {}",
                value
            )));
        }
        if self.baseline.eta_min == 0 {
            return Err(ConfigError::Invalid(
                "baseline eta_min must be at least 1".to_string(),
            ));
        }
        if self.baseline.eta_max < self.baseline.eta_min {
            return Err(ConfigError::Invalid(format!(
                "baseline eta_max ({}) is below eta_min ({})",
                self.baseline.eta_max, self.baseline.eta_min
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AssessmentConfig::default();
        assert_eq!(config.uncertainty_threshold, UncertaintyThreshold::Absolute(2.0));
        assert_eq!((config.baseline.eta_min, config.baseline.eta_max), (2, 4));
        assert_eq!(config.baseline.scope_title, "Project");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AssessmentConfig::from_yaml(
            "baseline:\n  eta_min: 3\n  eta_max: 6\n",
        )
        .unwrap();
        assert_eq!((config.baseline.eta_min, config.baseline.eta_max), (3, 6));
        assert_eq!(config.baseline.risk, "Medium");
        assert_eq!(config.uncertainty_threshold, UncertaintyThreshold::Absolute(2.0));
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let result = AssessmentConfig::from_json(
            r#"{ "uncertainty_threshold": { "absolute": -1 } }"#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_inverted_baseline_rejected() {
        let result = AssessmentConfig::from_yaml("baseline:\n  eta_min: 5\n  eta_max: 2\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
