//! Prompts for the strategic plan request.
//!
//! The system prompt fixes the output structure: a `<master_plan>` wrapper
//! holding one tagged section per plan part. The user prompt carries the
//! client's description, their questionnaire answers and the rule-based
//! result.

use std::fmt::Write as _;

use feasibility_core::format::format_duration;
use feasibility_core::{Answers, AssessmentResult, Catalog, DESCRIPTION_QUESTION_ID};

use crate::providers::ChatMessage;

/// Tag wrapping the whole plan.
pub const MASTER_PLAN_TAG: &str = "master_plan";

/// Section tags every plan must contain, in order.
pub const REQUIRED_SECTIONS: [&str; 6] = [
    "executive_summary",
    "strategic_recommendations",
    "phased_project_roadmap",
    "team_and_resource_plan",
    "budgetary_considerations",
    "next_steps",
];

pub const SYSTEM_PROMPT: &str = r#"
You are a principal technology strategy consultant advising executive clients on AI and data projects.

Be direct and specific. Tie every technology recommendation to a business outcome. Use Markdown headings, lists and tables.

Produce a complete strategic project plan. Wrap the plan in <master_plan> ... </master_plan> and put each section inside its tag exactly as laid out below. Every section is mandatory.

<master_plan>

<executive_summary>
### 1. Executive Summary
The project's goal, the business problem, the proposed solution, 3-4 measurable outcomes, and an overall feasibility judgement that builds on the preliminary assessment.
</executive_summary>

<strategic_recommendations>
### 2. Strategic Recommendations
Why the recommended technology approach fits this client's data and goals. A risk table with columns 'Risk Category', 'Description', 'Impact (High/Med/Low)' and 'Mitigation Strategy', covering the assessment's warnings. The KPIs that define success.
</strategic_recommendations>

<phased_project_roadmap>
### 3. Phased Project Roadmap
A table with columns 'Phase', 'Objectives', 'Key Activities', 'Deliverables' and 'Estimated Timeline', covering at least discovery/proof of concept, MVP and production.
</phased_project_roadmap>

<team_and_resource_plan>
### 4. Team & Resource Plan
A table with columns 'Role', 'Key Responsibilities' and an allocation percentage per phase, covering every role from the assessment.
</team_and_resource_plan>

<budgetary_considerations>
### 5. Budgetary Considerations
A table with columns 'Category', 'Description', 'Relative Cost (High/Med/Low)' and 'Key Cost Drivers', including personnel, cloud infrastructure, third-party APIs/data and a 15-20% contingency. Then practical budget management advice.
</budgetary_considerations>

<next_steps>
### 6. Immediate Next Steps
A numbered list of the 4-7 actions the client should take first.
</next_steps>

</master_plan>
"#;

/// Builds the messages for one plan request.
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder<'a> {
    catalog: &'a Catalog,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    /// Question text and chosen option label for every answered option
    /// question. The description and free-text answers are left out.
    pub fn questionnaire_summary(&self, answers: &Answers) -> String {
        let mut out = String::from("The client answered the questionnaire as follows:\n");
        for (question_id, value) in answers.iter() {
            if question_id == DESCRIPTION_QUESTION_ID {
                continue;
            }
            let Some(question) = self.catalog.question(question_id) else {
                continue;
            };
            let Some(option) = question.option(value) else {
                continue;
            };
            let _ = writeln!(out, "- Q: {}\n  A: {}", question.text, option.label);
        }
        out
    }

    pub fn result_summary(&self, result: &AssessmentResult) -> String {
        let mut out = String::from("A preliminary rule-based assessment produced:\n");

        if let Some(feasibility) = &result.feasibility {
            let _ = writeln!(
                out,
                "- **Feasibility:** Risk is {}, Confidence is {}.",
                feasibility.risk, feasibility.confidence
            );
        }
        if let Some(eta) = result.eta {
            let _ = writeln!(
                out,
                "- **Timeline:** Estimated {} for a {}.",
                format_duration(eta.min, eta.max, "months"),
                result.scope_title.as_deref().unwrap_or("project")
            );
        }
        if !result.tech_profile.is_empty() {
            let profile = serde_json::to_string_pretty(&result.tech_profile).unwrap_or_default();
            let _ = writeln!(out, "- **Recommended Tech Profile:** {}", profile);
        }
        if !result.roles.is_empty() {
            let titles: Vec<&str> = result.roles.values().map(|r| r.title.as_str()).collect();
            let _ = writeln!(out, "- **Required Team Roles:** {}", titles.join(", "));
        }

        let lists = [
            ("Critical Warnings", &result.warnings),
            ("Technologies to Avoid", &result.avoid_tech),
            ("Success Factors", &result.success_factors),
        ];
        for (title, items) in lists {
            if items.is_empty() {
                continue;
            }
            let _ = writeln!(out, "- **{}:**", title);
            for item in items {
                let _ = writeln!(out, "  - {}", item);
            }
        }
        out
    }

    pub fn user_prompt(&self, description: &str, answers: &Answers, result: &AssessmentResult) -> String {
        format!(
            "**Client-Provided Information**\n---\n**Project Description:**\n{}\n---\n\
             **Questionnaire Summary:**\n{}\n---\n**Initial Automated Assessment:**\n{}\n---\n\n\
             Generate the complete strategic project plan now. Respond with a single block \
             starting with `<master_plan>` and ending with `</master_plan>`, and nothing else.",
            description.trim(),
            self.questionnaire_summary(answers),
            self.result_summary(result)
        )
    }

    pub fn messages(&self, description: &str, answers: &Answers, result: &AssessmentResult) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt()),
            ChatMessage::user(self.user_prompt(description, answers, result)),
        ]
    }
}
