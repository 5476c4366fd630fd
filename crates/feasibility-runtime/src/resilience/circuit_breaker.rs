//! Circuit breaker for provider calls.
//!
//! After repeated failures a provider's circuit opens and narrative requests
//! are answered with an error immediately instead of waiting on a failing
//! service. After the recovery timeout a trial call is allowed through.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::duration_str;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,

    /// Time the circuit stays open before a trial call, e.g. `"30s"`
    #[serde(with = "duration_str")]
    pub recovery_timeout: Duration,

    /// Trial successes needed to close the circuit again
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CircuitState {
    Closed { failures: u32 },
    Open { opened_at: Instant },
    HalfOpen { successes: u32 },
}

/// One circuit per provider name.
#[derive(Debug)]
pub struct CircuitBreaker {
    states: RwLock<HashMap<String, CircuitState>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Whether calls to `provider` should be refused right now.
    pub fn is_open(&self, provider: &str) -> bool {
        let mut states = self.states.write();
        let expired = match states.get(provider) {
            Some(CircuitState::Open { opened_at }) => {
                opened_at.elapsed() >= self.config.recovery_timeout
            }
            _ => return false,
        };

        if expired {
            states.insert(provider.to_string(), CircuitState::HalfOpen { successes: 0 });
            tracing::info!(provider, "Circuit half-open, allowing a trial call");
            false
        } else {
            true
        }
    }

    pub fn record_success(&self, provider: &str) {
        let mut states = self.states.write();
        match states.get(provider).cloned() {
            Some(CircuitState::HalfOpen { successes }) => {
                if successes + 1 >= self.config.success_threshold {
                    states.insert(provider.to_string(), CircuitState::Closed { failures: 0 });
                    tracing::info!(provider, "Circuit closed after successful recovery");
                } else {
                    states.insert(
                        provider.to_string(),
                        CircuitState::HalfOpen {
                            successes: successes + 1,
                        },
                    );
                }
            }
            Some(CircuitState::Closed { failures }) if failures > 0 => {
                states.insert(provider.to_string(), CircuitState::Closed { failures: 0 });
            }
            _ => {}
        }
    }

    pub fn record_failure(&self, provider: &str) {
        let mut states = self.states.write();
        let failures = match states.get(provider).cloned() {
            Some(CircuitState::Closed { failures }) => failures + 1,
            None => 1,
            Some(CircuitState::HalfOpen { .. }) => {
                states.insert(
                    provider.to_string(),
                    CircuitState::Open {
                        opened_at: Instant::now(),
                    },
                );
                tracing::warn!(provider, "Circuit reopened after failed trial call");
                return;
            }
            Some(CircuitState::Open { .. }) => return,
        };

        if failures >= self.config.failure_threshold {
            states.insert(
                provider.to_string(),
                CircuitState::Open {
                    opened_at: Instant::now(),
                },
            );
            tracing::warn!(provider, failures, "Circuit opened after repeated failures");
        } else {
            states.insert(provider.to_string(), CircuitState::Closed { failures });
        }
    }

    pub fn state(&self, provider: &str) -> CircuitState {
        self.states
            .read()
            .get(provider)
            .cloned()
            .unwrap_or(CircuitState::Closed { failures: 0 })
    }

    pub fn reset(&self) {
        self.states.write().clear();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
