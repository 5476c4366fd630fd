//! Core data model: answers, effects and assessment results.
//!
//! Field names on the wire follow the catalog JSON format (`techProfile`,
//! `avoidTech`, `eta_multiplier`, `scope_title`, ...), so results can be
//! persisted and reloaded without loss.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Id of the free-text question holding the project description.
pub const DESCRIPTION_QUESTION_ID: &str = "project_description";

/// Technology profile: a flat bag of aspect -> recommendation.
///
/// Merged shallowly, later keys overwrite earlier ones.
pub type TechProfile = IndexMap<String, JsonValue>;

/// Per-question rule conditions: question id -> accepted answer values.
pub type Conditions = IndexMap<String, Vec<String>>;

/// The answers recorded for one assessment, keyed by question id.
///
/// Iteration follows insertion order, and re-answering a question keeps its
/// original position. The order matters: effects are merged in this order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(IndexMap<String, String>);

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer, returning the previous one if any.
    pub fn insert(&mut self, question_id: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(question_id.into(), value.into())
    }

    /// The raw answer for a question, if recorded.
    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.0.get(question_id).map(String::as_str)
    }

    /// The answer for a question if it is recorded and non-empty.
    pub fn answered(&self, question_id: &str) -> Option<&str> {
        self.get(question_id).filter(|value| !value.is_empty())
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.answered(question_id).is_some()
    }

    pub fn remove(&mut self, question_id: &str) -> Option<String> {
        self.0.shift_remove(question_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Answers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A team role, either inline in an effect or from the catalog's role table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleDescriptor {
    #[serde(default)]
    pub title: String,

    /// Any further descriptor fields (description, seniority, allocation...)
    #[serde(flatten)]
    pub details: IndexMap<String, JsonValue>,
}

impl RoleDescriptor {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            details: IndexMap::new(),
        }
    }
}

/// Additive timeline adjustment, in months.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtaAdjustment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_min: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_max: Option<i64>,
}

/// Partial update of the feasibility verdict.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A declarative partial update attached to an answer option or a rule.
///
/// Every field is optional; the merger handles each one explicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effects {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_profile: Option<TechProfile>,

    /// Reference into the catalog's technology table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_profile_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<IndexMap<String, RoleDescriptor>>,

    /// References into the catalog's role table
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub role_ids: Option<Vec<String>>,

    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub warnings: Option<Vec<String>>,

    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub avoid_tech: Option<Vec<String>>,

    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub success_factors: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feasibility: Option<FeasibilityPatch>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<EtaAdjustment>,

    #[serde(
        default,
        rename = "eta_multiplier",
        skip_serializing_if = "Option::is_none"
    )]
    pub eta_multiplier: Option<f64>,

    #[serde(
        default,
        rename = "scope_title",
        skip_serializing_if = "Option::is_none"
    )]
    pub scope_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Effects {
    pub fn is_empty(&self) -> bool {
        *self == Effects::default()
    }
}

/// Accepts either `"text"` or `["text", ...]`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(item)) => Some(vec![item]),
        Some(OneOrMany::Many(items)) => Some(items),
        None => None,
    })
}

/// Estimated delivery window, in months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtaRange {
    pub min: u32,
    pub max: u32,
}

/// Risk and confidence verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feasibility {
    pub risk: String,
    pub confidence: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Outcome of the optional narrative plan request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Success,
    Error,
    Skipped,
}

/// The assembled result of one assessment run.
///
/// Either a full report (`insufficient_info == false`, report fields set) or
/// the insufficient-information outcome (report fields absent, collections
/// empty, `uncertain_areas` listing the questions to revisit).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default)]
    pub tech_profile: TechProfile,

    #[serde(default)]
    pub roles: IndexMap<String, RoleDescriptor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<EtaRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feasibility: Option<Feasibility>,

    #[serde(default)]
    pub warnings: Vec<String>,

    #[serde(default)]
    pub avoid_tech: Vec<String>,

    #[serde(default)]
    pub success_factors: Vec<String>,

    #[serde(
        default,
        rename = "scope_title",
        skip_serializing_if = "Option::is_none"
    )]
    pub scope_title: Option<String>,

    #[serde(default)]
    pub insufficient_info: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insufficient_info_message: Option<String>,

    #[serde(default)]
    pub uncertain_areas: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_generated_plan: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_plan_status: Option<PlanStatus>,
}

impl AssessmentResult {
    /// The insufficient-information outcome.
    pub fn insufficient(message: impl Into<String>, uncertain_areas: Vec<String>) -> Self {
        Self {
            insufficient_info: true,
            insufficient_info_message: Some(message.into()),
            uncertain_areas,
            ..Default::default()
        }
    }

    /// Attach the narrative generator's output.
    ///
    /// This is the only mutation allowed after assembly.
    pub fn attach_plan(&mut self, status: PlanStatus, content: Option<String>) {
        self.ai_plan_status = Some(status);
        self.ai_generated_plan = content;
    }
}
