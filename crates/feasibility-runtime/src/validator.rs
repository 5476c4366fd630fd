//! Structural validation of generated plans.
//!
//! A plan is accepted only when it carries the `<master_plan>` wrapper and
//! every required section tag. Anything else counts as malformed output and
//! is retried by the generator. Accepted plans are normalised to plain
//! Markdown by stripping the tags.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::prompts::REQUIRED_SECTIONS;

lazy_static! {
    static ref MASTER_PLAN: Regex = Regex::new(r"(?s)<master_plan>(.*?)</master_plan>").unwrap();

    static ref SECTION_TAG: Regex = Regex::new(&format!(
        r"</?(?:{})>",
        REQUIRED_SECTIONS.join("|")
    ))
    .unwrap();

    static ref EXTRA_BLANK_LINES: Regex = Regex::new(r"\n{3,}").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanValidationError {
    #[error("Generated plan is empty")]
    Empty,

    #[error("Generated plan is missing the <master_plan> wrapper")]
    MissingWrapper,

    #[error("Generated plan is missing the <{0}> section")]
    MissingSection(String),
}

/// A plan that passed validation, as Markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPlan {
    pub markdown: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlanValidator;

impl PlanValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, text: &str) -> Result<ValidatedPlan, PlanValidationError> {
        if text.trim().is_empty() {
            return Err(PlanValidationError::Empty);
        }

        let body = MASTER_PLAN
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .ok_or(PlanValidationError::MissingWrapper)?;

        for section in REQUIRED_SECTIONS {
            let open = format!("<{}>", section);
            let close = format!("</{}>", section);
            if !body.contains(&open) || !body.contains(&close) {
                return Err(PlanValidationError::MissingSection(section.to_string()));
            }
        }

        let stripped = SECTION_TAG.replace_all(body, "");
        let collapsed = EXTRA_BLANK_LINES.replace_all(&stripped, "\n\n");
        let markdown = collapsed.trim().to_string();
        if markdown.is_empty() {
            return Err(PlanValidationError::Empty);
        }

        Ok(ValidatedPlan { markdown })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn well_formed_plan() -> String {
        let mut plan = String::from("Sure, here it is.\n<master_plan>\n");
        for (i, section) in REQUIRED_SECTIONS.iter().enumerate() {
            plan.push_str(&format!(
                "<{section}>\n### {}. {section}\nBody of {section}.\n</{section}>\n\n\n",
                i + 1
            ));
        }
        plan.push_str("</master_plan>\nThanks!");
        plan
    }

    #[test]
    fn test_accepts_complete_plan() {
        let plan = PlanValidator::new().validate(&well_formed_plan()).unwrap();

        assert!(plan.markdown.starts_with("### 1. executive_summary"));
        assert!(plan.markdown.ends_with("Body of next_steps."));
        assert!(!plan.markdown.contains('<'));
        assert!(!plan.markdown.contains("\n\n\n"));
        assert!(!plan.markdown.contains("Sure, here it is"));
    }

    #[test]
    fn test_rejects_missing_wrapper() {
        let text = well_formed_plan()
            .replace("<master_plan>", "")
            .replace("</master_plan>", "");
        assert_eq!(
            PlanValidator::new().validate(&text),
            Err(PlanValidationError::MissingWrapper)
        );
    }

    #[test]
    fn test_rejects_missing_section() {
        let text = well_formed_plan().replace("</budgetary_considerations>", "");
        assert_eq!(
            PlanValidator::new().validate(&text),
            Err(PlanValidationError::MissingSection(
                "budgetary_considerations".to_string()
            ))
        );
    }

    #[test]
    fn test_rejects_blank_text() {
        assert_eq!(
            PlanValidator::new().validate("  \n"),
            Err(PlanValidationError::Empty)
        );
    }

    #[test]
    fn test_keeps_other_markup() {
        let text = well_formed_plan().replace("Body of next_steps.", "Use <b>bold</b> sparingly.");
        let plan = PlanValidator::new().validate(&text).unwrap();
        assert!(plan.markdown.contains("Use <b>bold</b> sparingly."));
    }
}
