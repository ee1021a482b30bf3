use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

use wellflow::config::Config;
use wellflow::detector::{IntentDetector, KeywordDetector};
use wellflow::domain::{ExecutionSummary, StepResult, StepResults, WorkflowState};
use wellflow::planner::{ExecutionPlanner, Planner};
use wellflow::strategy::{DefaultStrategy, Strategy};
use wellflow::tools::ToolRegistry;

mod cli;

use cli::Cli;
use cli::commands::Commands;

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wellflow")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("wellflow.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// `log_level` from the config file caps the level when RUST_LOG is not set.
fn apply_log_level(config: &Config) {
    if std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    if let Some(level) = config.log_level.as_deref() {
        match level.parse::<log::LevelFilter>() {
            Ok(filter) => log::set_max_level(filter),
            Err(_) => log::warn!("Ignoring unknown log_level '{}'", level),
        }
    }
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Detect { query } => handle_detect_command(query),
        Commands::Plan { query, json } => handle_plan_command(query, *json, config),
        Commands::Run { query, json } => handle_run_command(query, *json, config).await,
    }
}

fn handle_detect_command(query: &str) -> Result<()> {
    info!("Detecting intent for: {}", query);
    let detector = KeywordDetector::new();
    let signals = detector.signals(query);
    let intent = detector.extract_intent(query);

    let verdict = if signals.any() {
        "multi-tool".green()
    } else {
        "single-tool".yellow()
    };
    println!("{} {}", "Detection:".cyan(), verdict);
    println!("  sequencing:        {}", signals.sequencing);
    println!("  batch quantifier:  {}", signals.batch_quantifier);
    println!("  multiple entities: {}", signals.multiple_entities);
    println!("  action list:       {}", signals.action_list);

    let tools: Vec<&str> = intent.tools().iter().map(|t| t.as_str()).collect();
    println!("{} {}", "Tools:".cyan(), tools.join(", "));
    println!("{} {}", "Actions:".cyan(), intent.actions().join(", "));
    println!(
        "{} {}",
        "Parameters:".cyan(),
        serde_json::to_string(intent.parameters()).context("Failed to encode parameters")?
    );
    Ok(())
}

fn handle_plan_command(query: &str, json: bool, config: &Config) -> Result<()> {
    info!("Planning query: {}", query);
    let intent = KeywordDetector::new().extract_intent(query);
    let plan = ExecutionPlanner::from_config(&config.planner)
        .plan(query, &intent)
        .context("Failed to build plan")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&plan).context("Failed to encode plan")?
        );
    } else {
        print!("{}", plan.render());
    }
    Ok(())
}

async fn handle_run_command(query: &str, json: bool, config: &Config) -> Result<()> {
    info!("Running query: {}", query);
    let strategy = DefaultStrategy::from_config(config, ToolRegistry::dry_run());

    if !strategy.can_handle(query) {
        println!("{}", "Query looks single-tool; running it through the planner anyway".yellow());
    }

    let state = strategy.execute(WorkflowState::new(query)).await;
    strategy.executor().shutdown();

    if let Some(error) = &state.error {
        eyre::bail!("{:?} stage failed: {}", error.stage, error.message);
    }

    let results: StepResults = match state.metadata.get(wellflow::domain::RESULTS_METADATA_KEY) {
        Some(value) => serde_json::from_value(value.clone()).context("Failed to decode step results")?,
        None => StepResults::new(),
    };
    print_results(&results);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&results).context("Failed to encode results")?
        );
    }

    println!("{}", "Response:".cyan().bold());
    println!("{}", state.response.unwrap_or_default());
    println!("{} {}", "Trace:".dimmed(), state.trace_id.dimmed());
    Ok(())
}

fn print_results(results: &StepResults) {
    for result in results.values() {
        match result {
            StepResult::Success {
                step_id,
                tool_name,
                duration_ms,
                ..
            } => println!("  {} step {} {} ({}ms)", "ok".green(), step_id, tool_name, duration_ms),
            StepResult::Failure(f) => println!(
                "  {} step {} {} [{}] {}",
                "failed".red(),
                f.step_id,
                f.tool_name,
                f.kind,
                f.message
            ),
        }
    }
    let summary = ExecutionSummary::from_results(results);
    let line = format!("{}/{} steps succeeded", summary.succeeded, summary.total);
    if summary.all_succeeded() {
        println!("{}", line.green());
    } else {
        println!("{}", line.yellow());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging before anything else logs
    setup_logging(cli.is_verbose()).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    apply_log_level(&config);

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
