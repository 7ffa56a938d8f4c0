// datacheck/src/commands/run.rs
//
// USE CASE: Run the quality checks of a project.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use tracing::warn;

use datacheck_core::application::{Checker, run_validation};
use datacheck_core::domain::result::{CheckStatus, RunReport};
use datacheck_core::domain::rule::RuleFamily;
use datacheck_core::infrastructure::adapters::DuckDbExecutor;
use datacheck_core::infrastructure::config::{
    load_project_config, load_rules, resolve_connection,
};
use datacheck_core::infrastructure::report::write_reports;
use datacheck_core::ports::SystemClock;

use crate::cli::ReportChoice;

const EXIT_CHECKS_FAILED: u8 = 1;
const EXIT_CONNECTION_FAILED: u8 = 2;

pub async fn execute(
    project_dir: PathBuf,
    env: String,
    checks: Option<String>,
    report: ReportChoice,
) -> anyhow::Result<ExitCode> {
    // A. Load the Config (Infra)
    println!("⚙️  Loading configuration...");
    let config = load_project_config(&project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;
    println!("   Project: {} (env: {})", config.name, env);

    let families = RuleFamily::parse_list(checks.as_deref().unwrap_or_default())
        .context("Invalid --checks selection")?;

    // B. Load the rule sets
    let rules_dir = config.rules_dir(&project_dir);
    let rule_set = load_rules(&rules_dir, &families)
        .with_context(|| format!("Failed to load rules from {:?}", rules_dir))?;
    let rules = rule_set.select(&families);
    println!("   Rules: {} enabled", rules.len());
    if rules.is_empty() {
        warn!(dir = ?rules_dir, "No enabled rules for the selected checks");
    }

    // C. Connect to the warehouse
    let settings = resolve_connection(&project_dir, &config, &env)?;
    let executor = match DuckDbExecutor::connect(&settings).await {
        Ok(executor) => executor,
        Err(e) => {
            eprintln!("\n🔌 CONNECTION FAILED: {}", e);
            return Ok(ExitCode::from(EXIT_CONNECTION_FAILED));
        }
    };
    println!("   Engine: DuckDB 🦆 ({})", settings.path);

    // D. Run the checks (Application Layer)
    let checker = Checker::new(config.counting, Arc::new(SystemClock));
    let run = run_validation(&checker, &rules, &families, &executor).await;

    // E. Reports
    let formats = report.formats();
    if !formats.is_empty() {
        let report_dir = config.report_dir(&project_dir);
        let written = write_reports(&run, &report_dir, &formats)
            .with_context(|| format!("Failed to write reports to {:?}", report_dir))?;
        for path in written {
            println!("📝 Report: {}", path.display());
        }
    }

    print_summary(&run);

    if run.summary.is_success() {
        println!(
            "\n✨ SUCCESS! {} checks passed in {:.2}s",
            run.summary.total_checks, run.elapsed_secs
        );
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!(
            "\n❌ FAILURE. {} failed, {} errored.",
            run.summary.failed, run.summary.errors
        );
        Ok(ExitCode::from(EXIT_CHECKS_FAILED))
    }
}

fn print_summary(run: &RunReport) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Rule",
            "Check",
            "Table",
            "Column",
            "Status",
            "Rows",
            "Violations",
            "Ratio",
        ]);

    for result in &run.results {
        table.add_row(vec![
            Cell::new(result.rule_id()),
            Cell::new(result.check_type()),
            Cell::new(result.table_name()),
            Cell::new(result.column_name().unwrap_or("-")),
            status_cell(result.status()),
            Cell::new(result.total_rows()).set_alignment(CellAlignment::Right),
            Cell::new(result.violation_count()).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", result.violation_ratio()))
                .set_alignment(CellAlignment::Right),
        ]);
    }

    println!("\n{table}");

    let s = &run.summary;
    println!(
        "   Total: {} | PASS: {} | WARNING: {} | FAIL: {} | ERROR: {} | Pass rate: {}%",
        s.total_checks, s.passed, s.warnings, s.failed, s.errors, s.pass_rate
    );
}

fn status_cell(status: CheckStatus) -> Cell {
    let color = match status {
        CheckStatus::Pass => Color::Green,
        CheckStatus::Warning => Color::Yellow,
        CheckStatus::Fail => Color::Red,
        CheckStatus::Error => Color::Magenta,
    };
    Cell::new(status.as_str())
        .fg(color)
        .add_attribute(Attribute::Bold)
}
