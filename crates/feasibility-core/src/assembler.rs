//! Assessor: turns a set of answers into an assessment result.
//!
//! The pipeline is fixed:
//! 1. Evaluate uncertainty. Too uncertain → insufficient-information outcome
//! 2. Start from the configured baseline
//! 3. Merge the selected option effects, in answer order
//! 4. Merge the effects of every matching rule, in declaration order
//! 5. Clamp the timeline
//!
//! The same answers and catalog always produce the same result.

use crate::catalog::Catalog;
use crate::config::AssessmentConfig;
use crate::engine::{EffectMerger, ResultAccumulator, UncertaintyEvaluator};
use crate::types::{AssessmentResult, Answers};

/// Runs the rule-based assessment.
#[derive(Debug, Clone, Default)]
pub struct Assessor {
    config: AssessmentConfig,
    evaluator: UncertaintyEvaluator,
}

impl Assessor {
    pub fn new(config: AssessmentConfig) -> Self {
        let evaluator = UncertaintyEvaluator::new(config.uncertainty_threshold);
        Self { config, evaluator }
    }

    pub fn config(&self) -> &AssessmentConfig {
        &self.config
    }

    /// Assess `answers` against `catalog`.
    ///
    /// Never fails: unknown questions, unknown option values and dangling
    /// lookup ids are skipped.
    pub fn assess(&self, answers: &Answers, catalog: &Catalog) -> AssessmentResult {
        let report = self.evaluator.evaluate(answers, catalog);
        if report.has_uncertainty {
            tracing::info!(
                weight = report.weight,
                areas = report.areas.len(),
                "Not enough information to assess"
            );
            let message = report
                .message
                .unwrap_or_else(|| crate::engine::INSUFFICIENT_INFO_MESSAGE.to_string());
            return AssessmentResult::insufficient(message, report.areas);
        }

        let merger = EffectMerger::new(catalog);
        let mut acc = ResultAccumulator::from_baseline(&self.config.baseline);

        for (question_id, value) in answers.iter() {
            let effects = catalog
                .option(question_id, value)
                .and_then(|option| option.effects.as_ref());
            if let Some(effects) = effects {
                merger.merge(&mut acc, effects);
            }
        }

        let mut matched = 0usize;
        for (index, rule) in catalog.rules.iter().enumerate() {
            if rule.matches(answers) {
                tracing::debug!(rule = %rule.label(index), "Rule matched");
                merger.merge(&mut acc, &rule.effects);
                matched += 1;
            }
        }

        let result = acc.finish();
        tracing::info!(
            answers = answers.len(),
            rules_matched = matched,
            eta_min = result.eta.map(|e| e.min),
            eta_max = result.eta.map(|e| e.max),
            "Assessment assembled"
        );
        result
    }
}

/// Assess with the default configuration.
pub fn assess(answers: &Answers, catalog: &Catalog) -> AssessmentResult {
    Assessor::default().assess(answers, catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EtaRange;

    const CATALOG: &str = r#"{
        "categories": [{
            "name": "Readiness",
            "questions": [
                { "id": "dataAvailability", "text": "How much data do you have?", "options": [
                    { "value": "plenty", "label": "Plenty", "effects": {
                        "techProfile": { "model": "gradient boosting" },
                        "eta": { "addMin": 1, "addMax": 1 }
                    }},
                    { "value": "none", "label": "None", "is_uncertain": true, "uncertainty_weight": 3 }
                ]},
                { "id": "team", "text": "Do you have a team?", "options": [
                    { "value": "yes", "label": "Yes", "effects": {
                        "roleIds": ["ml_engineer"],
                        "eta": { "addMin": 1 }
                    }},
                    { "value": "no", "label": "No", "effects": {
                        "warnings": "You will need to hire"
                    }}
                ]}
            ]
        }],
        "rules": [
            { "id": "slow", "conditions": { "dataAvailability": ["plenty"], "team": ["yes"] },
              "effects": { "eta_multiplier": 1.5, "scope_title": "Full build" } },
            { "conditions": { "team": ["no"] },
              "effects": { "feasibility": { "risk": "High" } } }
        ],
        "roles": { "ml_engineer": { "title": "ML Engineer" } }
    }"#;

    fn catalog() -> Catalog {
        Catalog::from_json(CATALOG).unwrap()
    }

    #[test]
    fn test_baseline_when_nothing_answered() {
        let result = assess(&Answers::new(), &catalog());

        assert!(!result.insufficient_info);
        assert_eq!(result.eta, Some(EtaRange { min: 2, max: 4 }));
        assert_eq!(result.scope_title.as_deref(), Some("Project"));
        let feasibility = result.feasibility.unwrap();
        assert_eq!(feasibility.risk, "Medium");
        assert_eq!(feasibility.confidence, "Medium");
    }

    #[test]
    fn test_insufficient_info_skips_merging() {
        let answers: Answers = [("dataAvailability", "none"), ("team", "no")]
            .into_iter()
            .collect();
        let result = assess(&answers, &catalog());

        assert!(result.insufficient_info);
        assert_eq!(result.uncertain_areas, vec!["How much data do you have?".to_string()]);
        assert!(result.warnings.is_empty());
        assert!(result.eta.is_none());
        assert!(result.insufficient_info_message.is_some());
    }

    #[test]
    fn test_option_and_rule_effects_combine() {
        let answers: Answers = [("dataAvailability", "plenty"), ("team", "yes")]
            .into_iter()
            .collect();
        let result = assess(&answers, &catalog());

        // (2 + 1 + 1) * 1.5 = 6, (4 + 1) * 1.5 = 7.5 -> 8
        assert_eq!(result.eta, Some(EtaRange { min: 6, max: 8 }));
        assert_eq!(result.scope_title.as_deref(), Some("Full build"));
        assert_eq!(result.roles["ml_engineer"].title, "ML Engineer");
        assert_eq!(result.tech_profile["model"], "gradient boosting");
    }

    #[test]
    fn test_unmatched_rule_has_no_effect() {
        let answers: Answers = [("dataAvailability", "plenty"), ("team", "no")]
            .into_iter()
            .collect();
        let result = assess(&answers, &catalog());

        assert_eq!(result.eta, Some(EtaRange { min: 3, max: 5 }));
        assert_eq!(result.feasibility.unwrap().risk, "High");
        assert_eq!(result.warnings, vec!["You will need to hire".to_string()]);
    }

    #[test]
    fn test_free_text_answers_are_ignored() {
        let answers: Answers = [("project_description", "A churn model"), ("team", "maybe")]
            .into_iter()
            .collect();
        let result = assess(&answers, &catalog());

        assert_eq!(result.eta, Some(EtaRange { min: 2, max: 4 }));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_configured_baseline() {
        let config = AssessmentConfig::from_yaml("baseline:\n  eta_min: 3\n  eta_max: 6\n").unwrap();
        let result = Assessor::new(config).assess(&Answers::new(), &catalog());
        assert_eq!(result.eta, Some(EtaRange { min: 3, max: 6 }));
    }

    #[test]
    fn test_deterministic_output() {
        let answers: Answers = [("team", "yes"), ("dataAvailability", "plenty")]
            .into_iter()
            .collect();
        let catalog = catalog();

        let first = serde_json::to_string(&assess(&answers, &catalog)).unwrap();
        let second = serde_json::to_string(&assess(&answers, &catalog)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_extreme_eta_values_do_not_abort() {
        let catalog = Catalog::from_json(
            r#"{
            "categories": [{ "name": "Scale", "questions": [
                { "id": "a", "text": "A?", "options": [
                    { "value": "x", "label": "X", "effects": {
                        "eta": { "addMin": 9223372036854775807, "addMax": 9223372036854775807 } } }
                ]},
                { "id": "b", "text": "B?", "options": [
                    { "value": "x", "label": "X", "effects": {
                        "eta": { "addMin": 9223372036854775807, "addMax": 9223372036854775807 } } }
                ]}
            ]}]
        }"#,
        )
        .unwrap();
        let answers: Answers = [("a", "x"), ("b", "x")].into_iter().collect();

        let result = assess(&answers, &catalog);
        assert_eq!(result.eta, Some(EtaRange { min: u32::MAX, max: u32::MAX }));
    }
}
