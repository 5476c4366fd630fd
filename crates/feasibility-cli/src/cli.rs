use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::commands;
use crate::settings::AppConfig;
use crate::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "feasibility",
    about = "Assess the feasibility of AI and data projects from a questionnaire",
    version
)]
pub(crate) struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(long, global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Saved assessments file, overriding the configured one
    #[arg(long, global = true)]
    pub(crate) store: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub(crate) verbose: u8,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Check a question catalog against the schema and its own references
    Validate(ValidateArgs),
    /// Run an assessment for a set of answers
    Assess(AssessArgs),
    /// Inspect or remove saved assessments
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum HistoryCommand {
    /// List saved assessments, newest first
    List,
    /// Show one saved assessment
    Show(ShowArgs),
    /// Delete one saved assessment
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// Catalog file (.json, .yaml or .yml)
    pub(crate) catalog: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// Catalog file (.json, .yaml or .yml)
    #[arg(long)]
    pub(crate) catalog: PathBuf,

    /// Answers file: an object of question id to option value
    #[arg(long)]
    pub(crate) answers: Option<PathBuf>,

    /// Project description, replacing the one in the answers
    #[arg(long, conflicts_with = "description_file")]
    pub(crate) description: Option<String>,

    /// Read the project description from a file
    #[arg(long)]
    pub(crate) description_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub(crate) format: OutputFormat,

    /// Save the assessment under this name
    #[arg(long)]
    pub(crate) save: Option<String>,

    /// Re-assess a saved assessment; its answers are the starting point
    #[arg(long)]
    pub(crate) id: Option<String>,

    /// Do not request a strategic plan even when a provider is configured
    #[arg(long)]
    pub(crate) no_plan: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ShowArgs {
    pub(crate) id: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub(crate) format: OutputFormat,
}

#[derive(Args, Debug)]
pub(crate) struct DeleteArgs {
    pub(crate) id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

pub(crate) async fn run() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose)?;

    let config = AppConfig::load(cli.config.as_deref())?;
    let store_path = config.store_path(cli.store.as_deref());
    tracing::debug!(store = %store_path.display(), "Configuration loaded");

    match cli.command {
        Command::Validate(args) => commands::validate(&args),
        Command::Assess(args) => commands::assess(&args, &config, &store_path).await,
        Command::History { command } => match command {
            HistoryCommand::List => commands::history_list(&store_path),
            HistoryCommand::Show(args) => commands::history_show(&args, &store_path),
            HistoryCommand::Delete(args) => commands::history_delete(&args, &store_path),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_assess() {
        let cli = Cli::try_parse_from([
            "feasibility",
            "-vv",
            "assess",
            "--catalog",
            "catalog.json",
            "--answers",
            "answers.yaml",
            "--format",
            "json",
            "--save",
            "Churn",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Command::Assess(args) = cli.command else {
            panic!("expected assess");
        };
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.save.as_deref(), Some("Churn"));
        assert!(!args.no_plan);
    }

    #[test]
    fn test_description_sources_conflict() {
        let result = Cli::try_parse_from([
            "feasibility",
            "assess",
            "--catalog",
            "c.json",
            "--description",
            "x",
            "--description-file",
            "d.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_store_after_subcommand() {
        let cli = Cli::try_parse_from(["feasibility", "history", "list", "--store", "h.json"]).unwrap();
        assert_eq!(cli.store, Some(PathBuf::from("h.json")));
    }
}
