//! Narrative generation settings.
//!
//! Durations are written in humantime form (`"90s"`, `"2m"`, `"1h"`).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::providers::CompletionConfig;
use crate::resilience::CircuitBreakerConfig;
use crate::RuntimeError;

/// Serde adapter for humantime duration strings.
pub mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,

    /// Limit for a single provider call
    #[serde(with = "duration_str")]
    pub attempt_timeout: Duration,

    /// Total attempts, including the first
    pub max_attempts: u32,

    #[serde(with = "duration_str")]
    pub initial_backoff: Duration,

    #[serde(with = "duration_str")]
    pub max_backoff: Duration,

    /// Generated plans kept in memory
    pub cache_capacity: u64,

    #[serde(with = "duration_str")]
    pub cache_ttl: Duration,

    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            max_tokens: 8192,
            temperature: 0.7,
            attempt_timeout: Duration::from_secs(60),
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(10),
            cache_capacity: 128,
            cache_ttl: Duration::from_secs(3600),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl NarrativeConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.model.trim().is_empty() {
            return Err(RuntimeError::InvalidConfig("model must not be empty".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(RuntimeError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.attempt_timeout.is_zero() {
            return Err(RuntimeError::InvalidConfig(
                "attempt_timeout must be positive".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(RuntimeError::InvalidConfig(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }
        Ok(())
    }

    /// Per-request settings handed to the provider.
    pub fn completion(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: self.attempt_timeout,
        }
    }
}
