use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use reqforge_lib::models::GenerationMode;
use reqforge_lib::config::APP_VERSION;
use reqforge_lib::{init_tracing, PipelineConfig, TaskGenerationPipeline, TaskGenerationRequest};

#[derive(Parser)]
#[command(name = "reqforge")]
#[command(about = "Turn a requirements document into tracker tasks", long_about = None)]
#[command(version)]
struct Cli {
    /// Document to read; stdin when omitted
    input: Option<PathBuf>,

    /// Generation mode (template, model, llm); overrides TASK_GEN_MODE
    #[arg(long)]
    mode: Option<String>,

    /// Maximum number of requirement sentences to turn into tasks
    #[arg(long)]
    max_tasks: Option<usize>,

    /// Requirement detection threshold (0-1)
    #[arg(long)]
    threshold: Option<f32>,

    /// Epic name stamped on every task
    #[arg(long)]
    epic: Option<String>,

    /// Domain applied to every task
    #[arg(long)]
    domain: Option<String>,

    /// Print the effective configuration and exit
    #[arg(long)]
    show_config: bool,

    /// Single-line JSON instead of pretty output
    #[arg(long)]
    compact: bool,
}

fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "reqforge failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = PipelineConfig::from_env().context("invalid configuration")?;
    if let Some(mode) = &cli.mode {
        config.mode = GenerationMode::parse(mode).with_context(|| format!("unknown mode {mode:?}"))?;
    }

    if cli.show_config {
        println!("{}", serde_json::to_string_pretty(&config.summary())?);
        return Ok(());
    }

    tracing::info!(version = APP_VERSION, mode = config.mode.as_str(), "reqforge starting");

    let text = read_input(cli.input.as_ref())?;
    let pipeline = TaskGenerationPipeline::new(&config).context("failed to build pipeline")?;

    let mut request = TaskGenerationRequest::new(text)
        .with_max_tasks(cli.max_tasks.unwrap_or(config.max_tasks))
        .with_threshold(cli.threshold.unwrap_or(config.requirement_threshold));
    if let Some(epic) = &cli.epic {
        request = request.with_epic(epic);
    }
    if let Some(domain) = &cli.domain {
        request = request.with_domain_hint(domain);
    }

    let response = pipeline.generate_tasks(&request);
    let json = if cli.compact {
        serde_json::to_string(&response)?
    } else {
        serde_json::to_string_pretty(&response)?
    };
    println!("{json}");
    Ok(())
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).context("failed to read stdin")?;
            Ok(text)
        }
    }
}
