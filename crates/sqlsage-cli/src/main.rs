// Sqlsage CLI
//
// Design Decision: Use clap derive for ergonomic argument parsing.
// Design Decision: Flags fall back to environment variables, with .env
// support via dotenvy, so deployment and local use share one config path.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use sqlsage_core::{Agent, AgentConfig, FileInteractionLogger, NoopInteractionLogger};
use sqlsage_db::{database_tool_registry, Database};
use sqlsage_openai::OpenAiDriver;

#[derive(Parser)]
#[command(name = "sqlsage")]
#[command(about = "Ask questions about a PostgreSQL database in natural language")]
#[command(version)]
struct Cli {
    /// The question to ask, e.g. "What tables exist?"
    question: String,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Model to use
    #[arg(long, env = "SQLSAGE_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// Directory for per-run interaction logs
    #[arg(long, env = "SQLSAGE_LOG_DIR", default_value = "logs")]
    log_dir: String,

    /// Disable interaction log files
    #[arg(long)]
    no_log: bool,

    /// Maximum tolerated tool failures before the run is cut short
    #[arg(long, default_value = "3")]
    max_errors: u32,

    /// Hard bound on agent steps per run
    #[arg(long, default_value = "12")]
    step_ceiling: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; missing file is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let db = Database::from_url(&cli.database_url)
        .await
        .context("Failed to connect to the database")?;
    let registry = database_tool_registry(db);

    let driver = OpenAiDriver::new(cli.api_key);
    let config = AgentConfig::new(&cli.model)
        .with_max_errors(cli.max_errors)
        .with_step_ceiling(cli.step_ceiling);

    let agent = Agent::new(driver, registry, config);
    let agent = if cli.no_log {
        agent.with_logger(Arc::new(NoopInteractionLogger))
    } else {
        agent.with_logger(Arc::new(FileInteractionLogger::new(&cli.log_dir)))
    };

    let answer = agent.process(&cli.question).await;
    println!("{}", answer);

    Ok(())
}
