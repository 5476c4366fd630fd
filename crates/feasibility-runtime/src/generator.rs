//! Narrative plan generation.
//!
//! [`NarrativeGenerator::generate`] turns a finished assessment into a
//! strategic plan:
//! - Skips the call when there is no project description or the assessment
//!   was insufficient
//! - Refuses immediately while the provider's circuit is open
//! - Serves repeated requests from the cache
//! - Otherwise calls the provider with a per-attempt timeout, retrying
//!   malformed output and transient errors with exponential backoff
//!
//! Every path ends in a [`NarrativeOutcome`]; the rule-based result is never
//! blocked or altered by a failed plan.

use backon::{ExponentialBuilder, Retryable};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use feasibility_core::{Answers, AssessmentResult, Catalog, PlanStatus, DESCRIPTION_QUESTION_ID};

use crate::cache::{PlanCache, PlanKey};
use crate::config::NarrativeConfig;
use crate::prompts::PromptBuilder;
use crate::providers::{ChatMessage, CompletionConfig, LlmProvider, ProviderError};
use crate::resilience::CircuitBreaker;
use crate::validator::{PlanValidationError, PlanValidator};
use crate::RuntimeError;

/// Shown in place of the plan when generation fails.
pub const GENERATION_FAILED_MESSAGE: &str = "The AI strategic plan could not be generated right now. \
The rule-based assessment is complete and can be used as is. Please try again later.";

/// Explains a skipped plan to the user.
pub const SKIPPED_MESSAGE: &str = "The AI plan was skipped because a project description was not \
provided. Fill in the description and run the assessment again to use this feature.";

/// Inputs for one plan request.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeRequest<'a> {
    pub catalog: &'a Catalog,
    pub answers: &'a Answers,
    pub initial_result: &'a AssessmentResult,
    description: Option<&'a str>,
}

impl<'a> NarrativeRequest<'a> {
    /// Request using the answer to the description question, if any.
    pub fn new(catalog: &'a Catalog, answers: &'a Answers, initial_result: &'a AssessmentResult) -> Self {
        Self {
            catalog,
            answers,
            initial_result,
            description: answers.get(DESCRIPTION_QUESTION_ID),
        }
    }

    pub fn with_description(mut self, description: &'a str) -> Self {
        self.description = Some(description);
        self
    }

    /// The description, if it has any non-whitespace text.
    pub fn description(&self) -> Option<&'a str> {
        self.description.map(str::trim).filter(|d| !d.is_empty())
    }
}

/// What happened to a plan request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeOutcome {
    pub status: PlanStatus,

    /// The plan on success, the user-facing message on error
    pub content: Option<String>,

    /// Provider calls made; 0 for skipped, refused and cached requests
    pub attempts: u32,
}

impl NarrativeOutcome {
    pub fn skipped() -> Self {
        Self {
            status: PlanStatus::Skipped,
            content: None,
            attempts: 0,
        }
    }

    pub fn success(plan: impl Into<String>, attempts: u32) -> Self {
        Self {
            status: PlanStatus::Success,
            content: Some(plan.into()),
            attempts,
        }
    }

    pub fn error(attempts: u32) -> Self {
        Self {
            status: PlanStatus::Error,
            content: Some(GENERATION_FAILED_MESSAGE.to_string()),
            attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == PlanStatus::Success
    }

    /// Record this outcome on the result it was generated for.
    pub fn apply_to(&self, result: &mut AssessmentResult) {
        result.attach_plan(self.status, self.content.clone());
    }
}

/// Why a single provider attempt failed.
#[derive(Error, Debug)]
pub enum AttemptError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Malformed plan: {0}")]
    Malformed(#[from] PlanValidationError),

    #[error("Attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("Circuit open for provider {0}")]
    CircuitOpen(String),
}

impl AttemptError {
    pub fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Provider(e) => e.is_transient(),
            AttemptError::Malformed(_) | AttemptError::Timeout(_) => true,
            AttemptError::CircuitOpen(_) => false,
        }
    }
}

/// Generates strategic plans through an [`LlmProvider`].
pub struct NarrativeGenerator {
    provider: Arc<dyn LlmProvider>,
    config: NarrativeConfig,
    breaker: CircuitBreaker,
    cache: PlanCache,
    validator: PlanValidator,
}

impl NarrativeGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, config: NarrativeConfig) -> Self {
        let breaker = CircuitBreaker::new(config.circuit_breaker.clone());
        let cache = PlanCache::new(config.cache_capacity, config.cache_ttl);
        Self {
            provider,
            config,
            breaker,
            cache,
            validator: PlanValidator::new(),
        }
    }

    pub fn builder() -> NarrativeGeneratorBuilder {
        NarrativeGeneratorBuilder::new()
    }

    pub fn config(&self) -> &NarrativeConfig {
        &self.config
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn cache(&self) -> &PlanCache {
        &self.cache
    }

    pub async fn generate(&self, request: NarrativeRequest<'_>) -> NarrativeOutcome {
        let Some(description) = request.description() else {
            tracing::debug!("No project description, skipping plan");
            return NarrativeOutcome::skipped();
        };
        if request.initial_result.insufficient_info {
            tracing::debug!("Assessment is insufficient, skipping plan");
            return NarrativeOutcome::skipped();
        }

        let provider = self.provider.name();
        if self.breaker.is_open(provider) {
            tracing::warn!(provider, "Circuit open, not requesting a plan");
            return NarrativeOutcome::error(0);
        }

        let key = PlanKey::new(
            &self.config.model,
            description,
            request.answers,
            request.initial_result,
        );
        if let Some(plan) = self.cache.get(&key).await {
            tracing::debug!(provider, "Plan served from cache");
            return NarrativeOutcome::success(plan, 0);
        }

        let messages = PromptBuilder::new(request.catalog).messages(
            description,
            request.answers,
            request.initial_result,
        );
        let completion = self.config.completion();
        let attempts = AtomicU32::new(0);

        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.config.initial_backoff)
            .with_max_delay(self.config.max_backoff)
            .with_max_times(self.config.max_attempts.saturating_sub(1) as usize);

        let result = (|| async {
            attempts.fetch_add(1, Ordering::Relaxed);
            self.attempt(&messages, &completion).await
        })
        .retry(backoff)
        .sleep(tokio::time::sleep)
        .when(|e: &AttemptError| e.is_retryable())
        .notify(|e: &AttemptError, delay: Duration| {
            tracing::warn!(provider, error = %e, ?delay, "Plan attempt failed, retrying");
        })
        .await;

        let attempts = attempts.load(Ordering::Relaxed);
        match result {
            Ok(plan) => {
                tracing::info!(provider, attempts, "Strategic plan generated");
                self.cache.insert(key, plan.clone()).await;
                NarrativeOutcome::success(plan, attempts)
            }
            Err(e) => {
                tracing::warn!(provider, attempts, error = %e, "Strategic plan generation failed");
                NarrativeOutcome::error(attempts)
            }
        }
    }

    /// One provider call with timeout, breaker bookkeeping and validation.
    async fn attempt(
        &self,
        messages: &[ChatMessage],
        completion: &CompletionConfig,
    ) -> Result<String, AttemptError> {
        let provider = self.provider.name();
        if self.breaker.is_open(provider) {
            return Err(AttemptError::CircuitOpen(provider.to_string()));
        }

        let timeout = self.config.attempt_timeout;
        let call = self.provider.complete(messages.to_vec(), completion);
        let response = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                self.breaker.record_failure(provider);
                return Err(e.into());
            }
            Err(_) => {
                self.breaker.record_failure(provider);
                return Err(AttemptError::Timeout(timeout));
            }
        };

        // The service answered; malformed text is not a service failure
        self.breaker.record_success(provider);
        tracing::debug!(
            provider,
            model = %response.model,
            tokens = response.usage.total(),
            "Provider responded"
        );

        let plan = self.validator.validate(&response.content)?;
        Ok(plan.markdown)
    }
}

/// Builder for NarrativeGenerator.
pub struct NarrativeGeneratorBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    config: NarrativeConfig,
}

impl NarrativeGeneratorBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            config: NarrativeConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(mut self, config: NarrativeConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the generator, validating the configuration.
    pub fn build(self) -> Result<NarrativeGenerator, RuntimeError> {
        let provider = self
            .provider
            .ok_or_else(|| RuntimeError::NotConfigured("No provider set".to_string()))?;
        self.config.validate()?;

        Ok(NarrativeGenerator::new(provider, self.config))
    }
}

impl Default for NarrativeGeneratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
