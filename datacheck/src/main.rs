// datacheck/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use std::process::ExitCode;

use crate::cli::{Cli, Commands};

/// Exit code for anything that is neither a check outcome nor a connection failure.
const EXIT_UNEXPECTED: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    // 1. Setup Logging (Tracing)
    // RUST_LOG=debug datacheck run ... for the details
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        // --- USE CASE: RUN CHECKS ---
        Commands::Run {
            project_dir,
            env,
            checks,
            report,
        } => commands::run::execute(project_dir, env, checks, report).await,

        // --- USE CASE: LIST RULES ---
        Commands::Rules { project_dir } => {
            commands::rules::execute(&project_dir).map(|_| ExitCode::SUCCESS)
        }
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\n💥 CRITICAL ERROR: {:#}", e);
            ExitCode::from(EXIT_UNEXPECTED)
        }
    }
}
