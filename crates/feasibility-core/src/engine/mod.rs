//! The rules engine building blocks.
//!
//! - [`UncertaintyEvaluator`]: decides whether the answers are too uncertain to report on
//! - [`EffectMerger`]: folds one effects object into the result accumulator
//! - [`matches`]: tests a rule's conditions against the answers
//!
//! The [`Assessor`](crate::Assessor) drives them in a fixed order.

mod matcher;
mod merger;
mod uncertainty;

pub use matcher::matches;
pub use merger::{EffectMerger, LookupTables, ResultAccumulator};
pub use uncertainty::{
    UncertaintyEvaluator, UncertaintyReport, UncertaintyThreshold, INSUFFICIENT_INFO_MESSAGE,
};
