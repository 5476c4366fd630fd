//! Resilience for provider calls: the circuit breaker. Retries with
//! exponential backoff live in the generator.

mod circuit_breaker;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
