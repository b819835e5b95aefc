//! ota-agent - device update agent
//!
//! Asks the update server what to do and does it, one directive at a time.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ota_agent::{
    run_batch, DeviceProbe, Dispatcher, FailurePolicy, HttpFetcher, Planner, SystemRunner,
    UpdateClient,
};
use ota_common::AgentConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ota-agent", version, about = "Device update agent")]
struct Cli {
    /// Config file (default: $OTA_AGENT_CONFIG or /etc/ota-agent/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the update server URL
    #[arg(long, global = true)]
    server: Option<String>,

    /// Keep going after a failed directive
    #[arg(long, global = true)]
    continue_on_error: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Request directives and apply them (default)
    Run,
    /// Request directives and print what would be done
    Plan,
    /// Print the device report sent to the server
    Device,
    /// Print the effective configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = AgentConfig::load(cli.config)?;
    if let Some(server) = cli.server {
        config.server.url = server;
    }
    if cli.continue_on_error {
        config.batch.continue_on_error = true;
    }

    let runner = SystemRunner::new();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => apply_updates(&config, &runner),
        Command::Plan => print_plan(&config, &runner),
        Command::Device => {
            let report = DeviceProbe::new(&runner, &config).collect()?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn apply_updates(config: &AgentConfig, runner: &SystemRunner) -> Result<ExitCode> {
    info!("ota-agent v{} starting", env!("CARGO_PKG_VERSION"));

    let report = DeviceProbe::new(runner, config)
        .collect()
        .context("Failed to collect device report")?;
    let directives = UpdateClient::new(config.server.clone())?
        .request_directives(&report)
        .context("Failed to fetch update list")?;

    let fetcher = HttpFetcher::new(config.paths.clone())?;
    let dispatcher = Dispatcher::new(runner, &fetcher, config);
    let policy = FailurePolicy::from_continue_flag(config.batch.continue_on_error);
    let batch = run_batch(&dispatcher, &directives, policy);

    if batch.is_success() {
        info!("Completed.");
        return Ok(ExitCode::SUCCESS);
    }

    for failure in batch.failures() {
        if let Err(e) = &failure.result {
            error!("directive {} ({}) failed: {}", failure.index + 1, failure.label, e);
        }
    }
    if batch.not_attempted > 0 {
        error!("{} directive(s) not attempted", batch.not_attempted);
    }
    Ok(ExitCode::FAILURE)
}

fn print_plan(config: &AgentConfig, runner: &SystemRunner) -> Result<ExitCode> {
    let report = DeviceProbe::new(runner, config).collect()?;
    let directives = UpdateClient::new(config.server.clone())?.request_directives(&report)?;

    let planner = Planner::new(runner, config);

    let mut ok = true;
    for (i, directive) in directives.iter().enumerate() {
        match planner.plan(directive) {
            Ok(plan) => println!("{:>3}. {:<40} {}", i + 1, directive.label(), plan),
            Err(e) => {
                ok = false;
                println!("{:>3}. {:<40} error: {}", i + 1, directive.label(), e);
            }
        }
    }

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
