//! Catalog parsing from JSON/YAML.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::validate_catalog_schema;
use crate::types::{Answers, Conditions, Effects, RoleDescriptor, TechProfile};

/// Errors that can occur when loading a catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Catalog does not match schema: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),

    #[error("Catalog validation failed: {0}")]
    ValidationError(String),
}

/// How a question is answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Pick one of the listed options
    #[default]
    Radio,

    /// Free text, e.g. the project description
    Textarea,
}

/// One selectable answer of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub value: String,

    pub label: String,

    #[serde(default)]
    pub is_uncertain: bool,

    /// Only counted when `is_uncertain` is set
    #[serde(default = "default_uncertainty_weight")]
    pub uncertainty_weight: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<Effects>,
}

fn default_uncertainty_weight() -> f64 {
    1.0
}

/// A single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,

    pub text: String,

    #[serde(rename = "type", default)]
    pub kind: QuestionKind,

    #[serde(default)]
    pub options: Vec<AnswerOption>,
}

impl Question {
    /// Find the option whose value equals `value`.
    pub fn option(&self, value: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|opt| opt.value == value)
    }
}

/// A named group of questions, presented as one wizard step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub questions: Vec<Question>,
}

/// A declarative condition/effect pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Optional identifier, used only for logging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub conditions: Conditions,

    #[serde(default)]
    pub effects: Effects,
}

impl Rule {
    /// Whether the recorded answers satisfy every condition of this rule.
    pub fn matches(&self, answers: &Answers) -> bool {
        crate::engine::matches(&self.conditions, answers)
    }

    /// Label for log output.
    pub fn label(&self, index: usize) -> String {
        self.id.clone().unwrap_or_else(|| format!("rule[{}]", index))
    }
}

/// The complete question/rule data set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub categories: Vec<Category>,

    #[serde(default)]
    pub rules: Vec<Rule>,

    #[serde(default)]
    pub roles: IndexMap<String, RoleDescriptor>,

    #[serde(default)]
    pub technologies: IndexMap<String, TechProfile>,
}

impl Catalog {
    /// Parse a catalog from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let value: JsonValue = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a catalog from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a catalog from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a catalog from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a catalog file, choosing the format by extension (`.yaml`/`.yml`
    /// for YAML, anything else JSON).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            _ => Self::from_json_file(path),
        }
    }

    fn from_value(value: JsonValue) -> Result<Self, CatalogError> {
        validate_catalog_schema(&value).map_err(CatalogError::SchemaViolation)?;
        let catalog: Catalog = serde_json::from_value(value)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Structural checks the schema cannot express.
    fn validate(&self) -> Result<(), CatalogError> {
        if self.categories.is_empty() {
            return Err(CatalogError::ValidationError(
                "catalog has no categories".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for question in self.questions() {
            if question.id.trim().is_empty() {
                return Err(CatalogError::ValidationError(
                    "question with empty id".to_string(),
                ));
            }
            if !seen.insert(question.id.as_str()) {
                return Err(CatalogError::ValidationError(format!(
                    "Duplicate question ID: {}",
                    question.id
                )));
            }

            let mut values = HashSet::new();
            for option in &question.options {
                if !values.insert(option.value.as_str()) {
                    return Err(CatalogError::ValidationError(format!(
                        "Duplicate option value '{}' in question {}",
                        option.value, question.id
                    )));
                }
            }
        }

        // Dangling rule references are tolerated: such rules never match.
        for (index, rule) in self.rules.iter().enumerate() {
            for question_id in rule.conditions.keys() {
                if !seen.contains(question_id.as_str()) {
                    tracing::warn!(
                        rule = %rule.label(index),
                        question_id = %question_id,
                        "Rule references unknown question and will never match"
                    );
                }
            }
        }

        Ok(())
    }

    /// All questions in wizard order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.categories.iter().flat_map(|c| c.questions.iter())
    }

    /// All questions paired with the name of their category.
    pub fn questions_with_category(&self) -> impl Iterator<Item = (&str, &Question)> {
        self.categories
            .iter()
            .flat_map(|c| c.questions.iter().map(move |q| (c.name.as_str(), q)))
    }

    pub fn question_count(&self) -> usize {
        self.categories.iter().map(|c| c.questions.len()).sum()
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions().find(|q| q.id == id)
    }

    /// Resolve the option selected by `value` for question `question_id`.
    pub fn option(&self, question_id: &str, value: &str) -> Option<&AnswerOption> {
        self.question(question_id)?.option(value)
    }

    pub fn role(&self, id: &str) -> Option<&RoleDescriptor> {
        self.roles.get(id)
    }

    pub fn technology(&self, id: &str) -> Option<&TechProfile> {
        self.technologies.get(id)
    }
}
