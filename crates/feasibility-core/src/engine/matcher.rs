//! Rule condition matching.

use crate::types::{Answers, Conditions};

/// Whether `answers` satisfy every per-question condition.
///
/// Each condition requires the question to have a non-empty recorded answer
/// contained in its accepted values. Unanswered or unknown questions never
/// match. An empty condition set matches vacuously.
pub fn matches(conditions: &Conditions, answers: &Answers) -> bool {
    conditions.iter().all(|(question_id, accepted)| {
        answers
            .answered(question_id)
            .is_some_and(|answer| accepted.iter().any(|value| value == answer))
    })
}
