//! # feasibility-core
//!
//! Deterministic rules engine for project feasibility assessments.
//!
//! A questionnaire [`Catalog`] attaches declarative effects to answer options
//! and to conditional rules. Given a set of [`Answers`], the [`Assessor`]
//! answers:
//! - Is there enough information to assess at all?
//! - Which technologies and roles does the project need?
//! - How long will it take, and how risky is it?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same answers and catalog always produce the same result
//! 2. **No LLM calls**: Assessment is purely rule-based
//! 3. **Total**: Unknown questions, values and lookup ids are skipped, never errors
//!
//! ## Example
//!
//! ```rust,ignore
//! use feasibility_core::{assess, Answers, Catalog};
//!
//! let catalog = Catalog::from_path("catalog.json")?;
//! let answers: Answers = [("dataAvailability", "plenty")].into_iter().collect();
//! let result = assess(&answers, &catalog);
//!
//! if result.insufficient_info {
//!     println!("Clarify: {:?}", result.uncertain_areas);
//! } else {
//!     println!("{}", feasibility_core::format::render_text(&result));
//! }
//! ```

pub mod assembler;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod format;
pub mod history;
pub mod session;
pub mod types;

// Re-export main types at crate root
pub use assembler::{assess, Assessor};
pub use catalog::{AnswerOption, Catalog, CatalogError, Category, Question, QuestionKind, Rule};
pub use config::{AssessmentConfig, Baseline, ConfigError};
pub use engine::{UncertaintyReport, UncertaintyThreshold, INSUFFICIENT_INFO_MESSAGE};
pub use history::{AssessmentStore, JsonFileStore, MemoryStore, SavedAssessment, StoreError};
pub use session::{RunTicket, WizardSession, WizardStep};
pub use types::{
    AssessmentResult, Answers, Conditions, Effects, EtaAdjustment, EtaRange, Feasibility,
    FeasibilityPatch, PlanStatus, RoleDescriptor, TechProfile, DESCRIPTION_QUESTION_ID,
};
