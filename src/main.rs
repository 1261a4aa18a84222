// src/main.rs
use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, error, Level};

use taskweave::{Config, LlmClient, Orchestrator, OrchestratorError, OrchestratorSettings, RunReport};

const DEFAULT_TASK: &str = "Write a program that prints the next 20 leap years.";

#[derive(Parser)]
#[command(name = "taskweave")]
#[command(about = "Decompose a task, run the subtasks in parallel and synthesize one answer")]
#[command(args_conflicts_with_subcommands = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Cli>,

    #[arg(help = "Task to solve")]
    task: Option<String>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[arg(long, help = "API key (defaults to the configured environment variable)")]
    api_key: Option<String>,

    #[arg(long, help = "Model used to decompose the task")]
    decomposition_model: Option<String>,

    #[arg(long, help = "Model used by the workers")]
    worker_model: Option<String>,

    #[arg(long, help = "Model used for the final synthesis")]
    synthesis_model: Option<String>,
}

#[derive(Subcommand)]
enum Cli {
    /// Write the default configuration file
    Init {
        #[arg(short, long, help = "Force overwrite existing configuration")]
        force: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Pick up TOGETHER_API_KEY and friends from a local .env
    dotenv::dotenv().ok();

    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    if let Some(Cli::Init { force }) = args.command {
        let path = Config::init(force)?;
        println!("Configuration initialized at {}", path.display());
        return Ok(());
    }

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            exit(1);
        }
    };

    if let Some(model) = args.decomposition_model {
        config.models.decomposition = model;
    }
    if let Some(model) = args.worker_model {
        config.models.worker = model;
    }
    if let Some(model) = args.synthesis_model {
        config.models.synthesis = model;
    }

    let task = args.task.unwrap_or_else(|| DEFAULT_TASK.to_string());

    match run(&config, args.api_key, &task).await {
        Ok(report) => print_report(&report),
        Err(e) if e.is_unexpected() => {
            error!("Unexpected error: {}", e);
            exit(1);
        }
        Err(e) => {
            error!("Workflow failed: {:#}", anyhow::Error::new(e));
            exit(1);
        }
    }

    Ok(())
}

async fn run(config: &Config, api_key: Option<String>, task: &str) -> Result<RunReport, OrchestratorError> {
    config.validate()?;

    let client = LlmClient::from_config(config, api_key)?;
    let orchestrator = Orchestrator::new(Arc::new(client), OrchestratorSettings::from(config));

    info!("Using models: decomposition={}, worker={}, synthesis={}",
        config.models.decomposition, config.models.worker, config.models.synthesis);

    orchestrator.run_detailed(task).await
}

fn print_report(report: &RunReport) {
    println!("\n[ANALYSIS]: {}", report.decomposition.analysis);

    for (i, result) in report.worker_results.iter().enumerate() {
        println!("\n[WORKER {} - {}]: {}", i + 1, result.subtask.kind, result.subtask.description);
        println!("{}", result.output);
    }

    println!("\n=== FINAL ANSWER ===\n");
    println!("{}", report.answer);
}
