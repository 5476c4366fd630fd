use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use feasibility_core::format::{format_aspect_name, format_duration, render_text, truncate, RiskLevel, StatusLabel};
use feasibility_core::{
    Answers, AssessmentResult, AssessmentStore, Assessor, Catalog, JsonFileStore, PlanStatus,
    SavedAssessment, WizardSession, DESCRIPTION_QUESTION_ID,
};
use feasibility_runtime::{
    slides, LlmProvider, NarrativeGenerator, NarrativeOutcome, NarrativeRequest, ProviderRegistry,
    SKIPPED_MESSAGE,
};

use crate::cli::{AssessArgs, DeleteArgs, OutputFormat, ShowArgs, ValidateArgs};
use crate::settings::{AppConfig, ProviderSettings};

pub(crate) fn validate(args: &ValidateArgs) -> Result<()> {
    let catalog = load_catalog(&args.catalog)?;
    println!(
        "Catalog OK: {} categories, {} questions, {} rules",
        catalog.categories.len(),
        catalog.question_count(),
        catalog.rules.len()
    );
    Ok(())
}

pub(crate) async fn assess(args: &AssessArgs, config: &AppConfig, store_path: &Path) -> Result<()> {
    let catalog = load_catalog(&args.catalog)?;
    let mut store = JsonFileStore::new(store_path);
    let assessor = Assessor::new(config.assessment.clone());
    let mut session = WizardSession::new(&catalog);

    if let Some(id) = &args.id {
        let Some(saved) = store.get(id)? else {
            bail!("No saved assessment with id '{}'", id);
        };
        session.edit(&saved);
    }
    if let Some(path) = &args.answers {
        for (question_id, value) in load_answers(path)?.iter() {
            session.set_answer(question_id, value);
        }
    }
    if let Some(description) = read_description(args)? {
        session.set_answer(DESCRIPTION_QUESTION_ID, description);
    }

    let ticket = session.complete(&assessor);
    let Some(result) = session.result() else {
        bail!("Assessment produced no result");
    };

    let outcome = match (&config.provider, args.no_plan) {
        (Some(provider), false) => {
            let generator = NarrativeGenerator::builder()
                .provider(create_provider(provider)?)
                .config(config.narrative.clone())
                .build()
                .context("Failed to set up plan generation")?;
            generator
                .generate(NarrativeRequest::new(&catalog, session.answers(), result))
                .await
        }
        (_, true) => {
            tracing::info!("Strategic plan disabled with --no-plan");
            NarrativeOutcome::skipped()
        }
        (None, false) => {
            tracing::info!("No provider configured, skipping strategic plan");
            NarrativeOutcome::skipped()
        }
    };
    session.attach_plan(ticket, outcome.status, outcome.content);

    let Some(result) = session.result() else {
        bail!("Assessment produced no result");
    };
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Text => print!("{}", render_report(result)),
    }

    if let Some(name) = &args.save {
        let Some(record) = session.to_saved(name, Utc::now()) else {
            bail!("Assessment produced no result");
        };
        store
            .save(&record)
            .with_context(|| format!("Failed to save to {}", store_path.display()))?;
        eprintln!("Saved assessment '{}' as {}", record.name, record.id);
    }
    Ok(())
}

pub(crate) fn history_list(store_path: &Path) -> Result<()> {
    let records = JsonFileStore::new(store_path).load_all()?;
    if records.is_empty() {
        println!("No saved assessments in {}", store_path.display());
        return Ok(());
    }
    for record in &records {
        println!("{}", list_line(record));
    }
    Ok(())
}

pub(crate) fn history_show(args: &ShowArgs, store_path: &Path) -> Result<()> {
    let Some(record) = JsonFileStore::new(store_path).get(&args.id)? else {
        println!("No saved assessment with id '{}'", args.id);
        return Ok(());
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Text => {
            println!("{} ({})", record.name, record.date.format("%Y-%m-%d %H:%M UTC"));
            if let Some(description) = &record.description {
                println!("{}", description);
            }
            println!();
            for (question_id, value) in record.answers.iter() {
                if question_id != DESCRIPTION_QUESTION_ID {
                    println!("{}: {}", format_aspect_name(question_id), value);
                }
            }
            println!();
            print!("{}", render_report(&record.result));
        }
    }
    Ok(())
}

pub(crate) fn history_delete(args: &DeleteArgs, store_path: &Path) -> Result<()> {
    let mut store = JsonFileStore::new(store_path);
    if store.delete(&args.id)? {
        println!("Deleted {}", args.id);
    } else {
        println!("No saved assessment with id '{}'", args.id);
    }
    Ok(())
}

fn load_catalog(path: &Path) -> Result<Catalog> {
    Catalog::from_path(path).with_context(|| format!("Failed to load catalog {}", path.display()))
}

/// Answers as a JSON or YAML object of question id to value.
fn load_answers(path: &Path) -> Result<Answers> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read answers {}", path.display()))?;
    let answers = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)
            .with_context(|| format!("Invalid answers in {}", path.display()))?,
        _ => serde_json::from_str(&contents)
            .with_context(|| format!("Invalid answers in {}", path.display()))?,
    };
    Ok(answers)
}

fn read_description(args: &AssessArgs) -> Result<Option<String>> {
    if let Some(text) = &args.description {
        return Ok(Some(text.clone()));
    }
    match &args.description_file {
        Some(path) => fs::read_to_string(path)
            .map(Some)
            .with_context(|| format!("Failed to read description {}", path.display())),
        None => Ok(None),
    }
}

fn create_provider(settings: &ProviderSettings) -> Result<Arc<dyn LlmProvider>> {
    let registry = ProviderRegistry::with_defaults();
    let config = if settings.config.is_null() {
        serde_json::json!({})
    } else {
        settings.config.clone()
    };
    registry
        .create(&settings.kind, &config)
        .with_context(|| format!("Failed to create provider '{}'", settings.kind))
}

/// The text report, with a successful plan laid out as numbered slides.
fn render_report(result: &AssessmentResult) -> String {
    let plan = match (result.ai_plan_status, result.ai_generated_plan.as_deref()) {
        (Some(PlanStatus::Success), Some(plan)) => Some(plan),
        _ => None,
    };
    let Some(plan) = plan else {
        let mut out = render_text(result);
        // Insufficient results never reach the plan section
        if result.ai_plan_status == Some(PlanStatus::Skipped) && !result.insufficient_info {
            let _ = writeln!(out, "\nPlan: {}", SKIPPED_MESSAGE);
        }
        return out;
    };

    let mut without_plan = result.clone();
    without_plan.ai_generated_plan = None;
    let mut out = render_text(&without_plan);

    let pages = slides(plan);
    for (i, page) in pages.iter().enumerate() {
        let _ = writeln!(out, "\n--- Slide {}/{} ---\n{}", i + 1, pages.len(), page.trim_end());
    }
    out
}

fn list_line(record: &SavedAssessment) -> String {
    let result = &record.result;
    let status = StatusLabel::of(result);
    let risk = result
        .feasibility
        .as_ref()
        .map(|f| {
            let elevated = RiskLevel::parse(&f.risk).is_some_and(|level| level.is_elevated());
            format!("{}{}", f.risk, if elevated { " (!)" } else { "" })
        })
        .unwrap_or_else(|| "-".to_string());
    let eta = result
        .eta
        .map(|eta| format_duration(eta.min, eta.max, "months"))
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{:<14} {}  {:<32} {:<16} risk {:<12} {}",
        record.id,
        record.date.format("%Y-%m-%d"),
        truncate(&record.name, 30),
        status.to_string(),
        risk,
        eta
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use feasibility_core::{EtaRange, Feasibility};

    fn record(risk: &str) -> SavedAssessment {
        SavedAssessment {
            id: "1700000000000".to_string(),
            name: "Churn prediction for the retail loyalty programme".to_string(),
            date: Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap(),
            answers: Answers::new(),
            result: AssessmentResult {
                eta: Some(EtaRange { min: 3, max: 6 }),
                feasibility: Some(Feasibility {
                    risk: risk.to_string(),
                    confidence: "Medium".to_string(),
                    summary: None,
                }),
                ..Default::default()
            },
            description: None,
        }
    }

    #[test]
    fn test_list_line() {
        let line = list_line(&record("Very High"));
        assert!(line.starts_with("1700000000000  2024-03-05"));
        assert!(line.contains("Churn prediction for the retai..."));
        assert!(line.contains("Very High (!)"));
        assert!(line.ends_with("3-6 months"));

        assert!(!list_line(&record("Low")).contains("(!)"));
    }

    #[test]
    fn test_insufficient_listing() {
        let mut saved = record("Low");
        saved.result = AssessmentResult::insufficient("Need more", vec!["Data?".to_string()]);
        let line = list_line(&saved);
        assert!(line.contains("Needs More Info"));
        assert!(line.ends_with('-'));
    }

    #[test]
    fn test_report_splits_plan_into_slides() {
        let mut result = record("Low").result;
        result.attach_plan(
            PlanStatus::Success,
            Some("### 1. Summary\nGoal.\n### 2. Next Steps\nAct.".to_string()),
        );

        let report = render_report(&result);
        assert!(report.contains("--- Slide 1/2 ---\n### 1. Summary\nGoal."));
        assert!(report.contains("--- Slide 2/2 ---\n### 2. Next Steps\nAct."));
        assert!(!report.contains("Plan:\n"));
    }

    #[test]
    fn test_report_explains_skipped_plan() {
        let mut result = record("Low").result;
        result.attach_plan(PlanStatus::Skipped, None);
        assert!(render_report(&result).contains(SKIPPED_MESSAGE));
    }

    #[test]
    fn test_insufficient_report_omits_skipped_plan_note() {
        let mut result = AssessmentResult::insufficient("Need more", vec!["Data?".to_string()]);
        result.attach_plan(PlanStatus::Skipped, None);
        assert!(!render_report(&result).contains(SKIPPED_MESSAGE));
    }

    fn sample_args(save: &str, no_plan: bool) -> AssessArgs {
        let data = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data");
        AssessArgs {
            catalog: data.join("sample-catalog.json"),
            answers: Some(data.join("sample-answers.yaml")),
            description: None,
            description_file: None,
            format: OutputFormat::Json,
            save: Some(save.to_string()),
            id: None,
            no_plan,
        }
    }

    #[tokio::test]
    async fn test_saved_result_is_tagged_skipped_without_plan() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("history.json");

        assess(&sample_args("No provider", false), &AppConfig::default(), &store_path)
            .await
            .unwrap();
        assess(&sample_args("Opted out", true), &AppConfig::default(), &store_path)
            .await
            .unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&store_path).unwrap()).unwrap();
        let records = saved.as_array().unwrap();
        assert_eq!(records.len(), 2);
        for record in records {
            assert_eq!(record["result"]["aiPlanStatus"], "skipped");
            assert!(record["result"].get("aiGeneratedPlan").is_none());
        }
    }

    #[test]
    fn test_load_answers_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.yaml");
        fs::write(&path, "dataAvailability: plenty\nteamExperience: none\n").unwrap();

        let answers = load_answers(&path).unwrap();
        let order: Vec<_> = answers.iter().collect();
        assert_eq!(order, vec![("dataAvailability", "plenty"), ("teamExperience", "none")]);
    }
}
