//! Human-readable rendering of assessment results.

use std::fmt::{self, Write as _};

use serde_json::Value as JsonValue;

use crate::types::AssessmentResult;

/// `3 months` for a single value, `2-4 months` for a range.
pub fn format_duration(min: u32, max: u32, unit: &str) -> String {
    if min == max {
        format!("{} {}", min, unit)
    } else {
        format!("{}-{} {}", min, max, unit)
    }
}

/// Turn a camelCase key into a title: `dataVolume` -> `Data Volume`.
pub fn format_aspect_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if i == 0 {
            out.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            out.push(' ');
            out.push(ch);
        } else {
            out.push(ch);
        }
    }
    out.trim().to_string()
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `...`.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}...", text[..cut].trim_end()),
    }
}

/// Listing status of a saved assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLabel {
    NeedsMoreInfo,
    Complete,
}

impl StatusLabel {
    pub fn of(result: &AssessmentResult) -> Self {
        if result.insufficient_info {
            Self::NeedsMoreInfo
        } else {
            Self::Complete
        }
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NeedsMoreInfo => write!(f, "Needs More Info"),
            Self::Complete => write!(f, "Complete"),
        }
    }
}

/// Recognised risk levels. Catalogs may use any text; unknown values parse
/// to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "very high" => Some(Self::VeryHigh),
            _ => None,
        }
    }

    /// High and very high risk are flagged in listings.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::High | Self::VeryHigh)
    }
}

fn display_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn write_list(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{}:", title);
    for item in items {
        let _ = writeln!(out, "  - {}", item);
    }
}

/// Plain-text report for terminal output.
pub fn render_text(result: &AssessmentResult) -> String {
    let mut out = String::new();

    if result.insufficient_info {
        let _ = writeln!(out, "Status: {}", StatusLabel::NeedsMoreInfo);
        if let Some(message) = &result.insufficient_info_message {
            let _ = writeln!(out, "\n{}", message);
        }
        write_list(&mut out, "Areas to clarify", &result.uncertain_areas);
        return out;
    }

    if let Some(title) = &result.scope_title {
        let _ = writeln!(out, "{}", title);
        let _ = writeln!(out, "{}", "=".repeat(title.chars().count()));
    }
    if let Some(summary) = &result.summary {
        let _ = writeln!(out, "{}", summary);
    }

    if let Some(eta) = result.eta {
        let _ = writeln!(out, "\nEstimated timeline: {}", format_duration(eta.min, eta.max, "months"));
    }
    if let Some(feasibility) = &result.feasibility {
        let _ = writeln!(
            out,
            "Risk: {}  Confidence: {}",
            feasibility.risk, feasibility.confidence
        );
        if let Some(summary) = &feasibility.summary {
            let _ = writeln!(out, "{}", summary);
        }
    }

    if !result.tech_profile.is_empty() {
        let _ = writeln!(out, "\nTechnology profile:");
        // Category and summary lead the table.
        let priority = ["Category", "summary"];
        let ordered = priority
            .iter()
            .filter_map(|key| result.tech_profile.get_key_value(*key))
            .chain(
                result
                    .tech_profile
                    .iter()
                    .filter(|(key, _)| !priority.contains(&key.as_str())),
            );
        for (key, value) in ordered {
            let _ = writeln!(out, "  {}: {}", format_aspect_name(key), display_value(value));
        }
    }

    if !result.roles.is_empty() {
        let _ = writeln!(out, "\nTeam:");
        for (id, role) in &result.roles {
            let title = if role.title.is_empty() { id } else { &role.title };
            let _ = writeln!(out, "  - {}", title);
        }
    }

    write_list(&mut out, "Warnings", &result.warnings);
    write_list(&mut out, "Avoid", &result.avoid_tech);
    write_list(&mut out, "Success factors", &result.success_factors);

    if let Some(plan) = &result.ai_generated_plan {
        let _ = writeln!(out, "\nPlan:\n{}", plan);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EtaRange, Feasibility};
    use serde_json::json;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(3, 3, "months"), "3 months");
        assert_eq!(format_duration(2, 4, "months"), "2-4 months");
    }

    #[test]
    fn test_format_aspect_name() {
        assert_eq!(format_aspect_name("dataVolume"), "Data Volume");
        assert_eq!(format_aspect_name("model"), "Model");
        assert_eq!(format_aspect_name("Category"), "Category");
        assert_eq!(format_aspect_name(""), "");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("hello world again", 6), "hello...");
        assert_eq!(truncate("ünïcödé text", 3), "ünï...");
    }

    #[test]
    fn test_risk_level_parse() {
        assert_eq!(RiskLevel::parse("Very High"), Some(RiskLevel::VeryHigh));
        assert_eq!(RiskLevel::parse(" low "), Some(RiskLevel::Low));
        assert_eq!(RiskLevel::parse("moderate"), None);
        assert!(RiskLevel::High.is_elevated());
        assert!(!RiskLevel::Medium.is_elevated());
    }

    #[test]
    fn test_status_label() {
        let insufficient = AssessmentResult::insufficient("more", vec![]);
        assert_eq!(StatusLabel::of(&insufficient).to_string(), "Needs More Info");
        assert_eq!(StatusLabel::of(&AssessmentResult::default()), StatusLabel::Complete);
    }

    #[test]
    fn test_render_text_report() {
        let mut result = AssessmentResult {
            summary: Some("Looks doable".to_string()),
            eta: Some(EtaRange { min: 3, max: 5 }),
            feasibility: Some(Feasibility {
                risk: "Low".to_string(),
                confidence: "High".to_string(),
                summary: None,
            }),
            scope_title: Some("Pilot".to_string()),
            warnings: vec!["Check label quality".to_string()],
            ..Default::default()
        };
        result.tech_profile.insert("dataVolume".to_string(), json!("small"));
        result.tech_profile.insert("Category".to_string(), json!("Classical ML"));

        let text = render_text(&result);
        assert!(text.starts_with("Pilot\n=====\n"));
        assert!(text.contains("Estimated timeline: 3-5 months"));
        assert!(text.contains("Risk: Low  Confidence: High"));
        assert!(text.contains("  - Check label quality"));

        let category = text.find("Category: Classical ML").unwrap();
        let volume = text.find("Data Volume: small").unwrap();
        assert!(category < volume);
    }

    #[test]
    fn test_render_text_insufficient() {
        let result = AssessmentResult::insufficient("Need more", vec!["Data?".to_string()]);
        let text = render_text(&result);
        assert!(text.starts_with("Status: Needs More Info"));
        assert!(text.contains("  - Data?"));
        assert!(!text.contains("Estimated timeline"));
    }
}
