//! # feasibility-runtime
//!
//! Optional LLM-written strategic plans for feasibility assessments.
//!
//! ## Important
//!
//! This crate is OPTIONAL. The assessment in `feasibility-core` is fully
//! deterministic and never makes LLM calls. The narrative plan is layered on
//! top of a finished result and never changes the rule-based fields.
//!
//! A narrative request either succeeds, is skipped (no project description,
//! or the assessment was insufficient), or ends in an error status with a
//! user-facing message. [`NarrativeGenerator::generate`] never returns `Err`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use feasibility_runtime::{NarrativeGenerator, NarrativeRequest, NarrativeConfig};
//! use feasibility_runtime::providers::GeminiProvider;
//!
//! let provider = Arc::new(GeminiProvider::from_env()?);
//! let generator = NarrativeGenerator::builder()
//!     .provider(provider)
//!     .config(NarrativeConfig::default())
//!     .build()?;
//!
//! let outcome = generator
//!     .generate(NarrativeRequest::new(&catalog, &answers, &result))
//!     .await;
//! outcome.apply_to(&mut result);
//! ```

use thiserror::Error;

pub mod cache;
pub mod config;
pub mod generator;
pub mod prompts;
pub mod providers;
pub mod resilience;
pub mod slides;
pub mod validator;

pub use cache::PlanCache;
pub use config::NarrativeConfig;
pub use generator::{
    AttemptError, NarrativeGenerator, NarrativeGeneratorBuilder, NarrativeOutcome,
    NarrativeRequest, GENERATION_FAILED_MESSAGE, SKIPPED_MESSAGE,
};
pub use prompts::{PromptBuilder, REQUIRED_SECTIONS};
pub use providers::{LlmProvider, ProviderError, ProviderRegistry};
pub use slides::slides;
pub use validator::{PlanValidationError, PlanValidator, ValidatedPlan};

/// Errors from setting up the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("LLM provider not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid narrative configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}
