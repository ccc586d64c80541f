//! aetherium - finite-state automata engine
//!
//! Validates automata documents and runs them against the console.

mod cli;

use aetherium_core::{ExprEvaluator, Loader, Validator};
use aetherium_engine::{Config, EngineError, RunReport, Runner};
use aetherium_transport::{ConsoleTransport, Transport};
use clap::{CommandFactory, Parser};
use cli::{Action, Cli, CliError, Options};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let options = match Cli::parse().into_options() {
        Ok(options) => options,
        Err(e @ CliError::FileNotFound(_)) => {
            println!("{}", e);
            print_help();
            std::process::exit(1);
        }
    };

    // Initialize logging; RUST_LOG wins over the flags
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(options.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let code = match &options.action {
        Action::Validate(path) => validate(path),
        Action::Run(path) => match run(path, &options).await {
            Ok(report) => {
                eprintln!(
                    "{} '{}' {} in {} after {} steps ({} transitions)",
                    "Execution".green(),
                    report.automata,
                    report.phase,
                    report.final_state.as_deref().unwrap_or("-"),
                    report.steps,
                    report.transitions
                );
                0
            }
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                1
            }
        },
        Action::Idle => {
            print_help();
            0
        }
    };

    std::process::exit(code);
}

fn print_help() {
    if let Err(e) = Cli::command().print_help() {
        eprintln!("{}: {}", "Error".red(), e);
    }
    println!();
}

fn validate(path: &Path) -> i32 {
    match Validator::check(path) {
        Ok(()) => {
            println!("{}: {}", "Valid".green(), path.display());
            0
        }
        Err(e) => {
            eprintln!("{}: {}: {}", "Error".red(), path.display(), e);
            1
        }
    }
}

async fn run(path: &Path, options: &Options) -> Result<RunReport, EngineError> {
    Validator::check(path)?;

    // Config file (--config or AETHERIUM_CONFIG), then env, then flags
    let mut config = match &options.config {
        Some(file) => {
            let mut config = Config::from_file(file)?;
            config.apply_env_overrides();
            tracing::info!("Loaded config from {}", file.display());
            config
        }
        None => Config::load()?,
    };
    if let Some(mode) = options.mode {
        config.engine.mode = mode;
    }
    config.validate()?;

    let automata = Arc::new(Loader::load_file(path)?);
    tracing::info!(
        "Running '{}' version {} in {} mode",
        automata.name,
        automata.version,
        config.engine.mode
    );

    let console = ConsoleTransport::new().with_format(config.console.line_format());
    let transports: Vec<Box<dyn Transport>> = vec![Box::new(console)];
    let mut runner = Runner::new(
        automata,
        Arc::new(ExprEvaluator::new()),
        transports,
        config.engine.clone(),
    );

    let stop = runner.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping");
            stop.stop();
        }
    });

    runner.run().await
}
