//! Uncertainty evaluation.
//!
//! Options flagged `is_uncertain` carry a weight. When the summed weight of
//! the selected options exceeds the configured threshold, no report is
//! assembled and the caller receives the insufficient-information outcome.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::types::Answers;

/// Shown alongside the list of uncertain areas.
pub const INSUFFICIENT_INFO_MESSAGE: &str = "The assessment cannot be reliably generated because \
critical information is missing or uncertain. To create an accurate technology and resource plan, \
please gather more details on the following topics before re-running the assessment:";

/// When the accumulated uncertainty weight is too high.
///
/// The comparison is strict: a weight equal to the limit is still acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintyThreshold {
    /// Exceeding a fixed total weight
    Absolute(f64),

    /// Exceeding a fraction of the catalog's question count
    ShareOfQuestions(f64),
}

impl Default for UncertaintyThreshold {
    fn default() -> Self {
        Self::Absolute(2.0)
    }
}

impl UncertaintyThreshold {
    /// The weight limit for a catalog with `question_count` questions.
    pub fn limit(&self, question_count: usize) -> f64 {
        match *self {
            Self::Absolute(weight) => weight,
            Self::ShareOfQuestions(share) => share * question_count as f64,
        }
    }
}

/// What the evaluator found.
#[derive(Debug, Clone, PartialEq)]
pub struct UncertaintyReport {
    pub has_uncertainty: bool,

    /// Display text of each question answered with an uncertain option
    pub areas: Vec<String>,

    /// Sum of the uncertain options' weights
    pub weight: f64,

    /// Explanation for the user, set only when `has_uncertainty`
    pub message: Option<String>,
}

/// Scores the answers for uncertainty.
#[derive(Debug, Clone, Default)]
pub struct UncertaintyEvaluator {
    threshold: UncertaintyThreshold,
}

impl UncertaintyEvaluator {
    pub fn new(threshold: UncertaintyThreshold) -> Self {
        Self { threshold }
    }

    pub fn evaluate(&self, answers: &Answers, catalog: &Catalog) -> UncertaintyReport {
        let mut areas = Vec::new();
        let mut weight = 0.0;

        for (question_id, answer) in answers.iter() {
            let Some(question) = catalog.question(question_id) else {
                continue;
            };
            let Some(option) = question.option(answer) else {
                continue;
            };
            if option.is_uncertain {
                areas.push(question.text.clone());
                weight += option.uncertainty_weight;
            }
        }

        let limit = self.threshold.limit(catalog.question_count());
        let has_uncertainty = weight > limit;

        tracing::debug!(
            weight,
            limit,
            uncertain_questions = areas.len(),
            has_uncertainty,
            "Uncertainty evaluated"
        );

        UncertaintyReport {
            has_uncertainty,
            areas,
            weight,
            message: has_uncertainty.then(|| INSUFFICIENT_INFO_MESSAGE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_json(
            r#"{
            "categories": [{
                "name": "Readiness",
                "questions": [
                    { "id": "data", "text": "Data availability?", "options": [
                        { "value": "none", "label": "None", "is_uncertain": true, "uncertainty_weight": 3 },
                        { "value": "unsure", "label": "Not sure", "is_uncertain": true },
                        { "value": "plenty", "label": "Plenty", "uncertainty_weight": 10 }
                    ]},
                    { "id": "budget", "text": "Budget?", "options": [
                        { "value": "unknown", "label": "Unknown", "is_uncertain": true },
                        { "value": "set", "label": "Set" }
                    ]},
                    { "id": "team", "text": "Team?", "options": [
                        { "value": "unknown", "label": "Unknown", "is_uncertain": true, "uncertainty_weight": 1 }
                    ]}
                ]
            }]
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_heavy_uncertain_option_exceeds_default_threshold() {
        let answers: Answers = [("data", "none")].into_iter().collect();
        let report = UncertaintyEvaluator::default().evaluate(&answers, &catalog());

        assert!(report.has_uncertainty);
        assert_eq!(report.areas, vec!["Data availability?".to_string()]);
        assert_eq!(report.weight, 3.0);
        assert_eq!(report.message.as_deref(), Some(INSUFFICIENT_INFO_MESSAGE));
    }

    #[test]
    fn test_weight_equal_to_threshold_is_acceptable() {
        let answers: Answers = [("data", "unsure"), ("budget", "unknown")]
            .into_iter()
            .collect();
        let report = UncertaintyEvaluator::default().evaluate(&answers, &catalog());

        assert_eq!(report.weight, 2.0);
        assert!(!report.has_uncertainty);
        assert_eq!(report.areas.len(), 2);
        assert!(report.message.is_none());
    }

    #[test]
    fn test_unflagged_option_contributes_nothing() {
        let answers: Answers = [("data", "plenty")].into_iter().collect();
        let report = UncertaintyEvaluator::default().evaluate(&answers, &catalog());

        assert_eq!(report.weight, 0.0);
        assert!(report.areas.is_empty());
    }

    #[test]
    fn test_unknown_questions_and_values_are_ignored() {
        let answers: Answers = [("ghost", "none"), ("data", "free text")]
            .into_iter()
            .collect();
        let report = UncertaintyEvaluator::default().evaluate(&answers, &catalog());

        assert_eq!(report.weight, 0.0);
        assert!(!report.has_uncertainty);
    }

    #[test]
    fn test_share_of_questions_threshold() {
        // 3 questions * 0.5 = limit 1.5
        let evaluator = UncertaintyEvaluator::new(UncertaintyThreshold::ShareOfQuestions(0.5));
        let answers: Answers = [("budget", "unknown"), ("team", "unknown")]
            .into_iter()
            .collect();

        let report = evaluator.evaluate(&answers, &catalog());
        assert!(report.has_uncertainty);
    }

    #[test]
    fn test_threshold_config_format() {
        let threshold: UncertaintyThreshold =
            serde_yaml::from_str("share_of_questions: 0.3").unwrap();
        assert_eq!(threshold, UncertaintyThreshold::ShareOfQuestions(0.3));
        assert_eq!(threshold.limit(10), 3.0);
    }
}
