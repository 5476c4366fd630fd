//! `feasibility` command-line tool.

mod cli;
mod commands;
mod settings;
mod telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::run().await
}
