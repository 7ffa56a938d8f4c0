// datacheck/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use datacheck_core::infrastructure::report::ReportFormat;

#[derive(Parser)]
#[command(name = "datacheck")]
#[command(about = "Rule-driven data quality validation engine", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🚀 Runs the configured quality checks and writes the reports
    Run {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Environment (connection profile) from the project file
        #[arg(long, default_value = "development")]
        env: String,

        /// Check families to run (ex: "count,null"). All by default.
        #[arg(long)]
        checks: Option<String>,

        /// Report formats to write
        #[arg(long, value_enum, default_value_t = ReportChoice::All)]
        report: ReportChoice,
    },

    /// 📋 Lists the enabled rules per check family
    Rules {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportChoice {
    All,
    Html,
    Csv,
    Json,
    None,
}

impl ReportChoice {
    pub fn formats(&self) -> Vec<ReportFormat> {
        match self {
            Self::All => ReportFormat::ALL.to_vec(),
            Self::Html => vec![ReportFormat::Html],
            Self::Csv => vec![ReportFormat::Csv],
            Self::Json => vec![ReportFormat::Json],
            Self::None => Vec::new(),
        }
    }
}
