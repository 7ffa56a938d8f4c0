// datacheck-core/src/infrastructure/report/mod.rs

pub mod csv;
pub mod html;
pub mod json;

use chrono::{DateTime, Local};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::domain::result::RunReport;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    Html,
    Csv,
    Json,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 3] = [Self::Html, Self::Csv, Self::Json];

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    pub fn render(&self, report: &RunReport) -> Result<String, InfrastructureError> {
        match self {
            Self::Html => html::render(report),
            Self::Csv => csv::render(report),
            Self::Json => json::render(report),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown report format: {}", s)),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// `dq_report_<YYYYmmdd_HHMMSS>.<ext>`
pub fn report_file_name(format: ReportFormat, started_at: &DateTime<Local>) -> String {
    format!(
        "dq_report_{}.{}",
        started_at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Renders and writes one file per format into `report_dir`.
pub fn write_reports(
    report: &RunReport,
    report_dir: &Path,
    formats: &[ReportFormat],
) -> Result<Vec<PathBuf>, InfrastructureError> {
    let mut written = Vec::with_capacity(formats.len());

    for format in formats {
        let path = report_dir.join(report_file_name(*format, &report.started_at));
        let content = format.render(report)?;
        atomic_write(&path, content)?;
        info!(format = %format, path = ?path, "Report written");
        written.push(path);
    }

    Ok(written)
}

/// Small run used by the reporter tests.
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) fn sample_report() -> RunReport {
    use crate::domain::result::{CheckDetails, CheckResult, CheckStatus, CheckType};
    use crate::domain::rule::RuleDefinition;
    use chrono::TimeZone;

    let rule = |yaml: &str| serde_yaml::from_str::<RuleDefinition>(yaml).unwrap();
    let results = vec![
        CheckResult::new(
            &rule("rule_id: CNT-001\ndescription: txn parity\nsource_table: src_txn"),
            CheckType::Count,
            CheckStatus::Pass,
            10,
            0,
            CheckDetails::message("counts match"),
        ),
        CheckResult::new(
            &rule("rule_id: NUL-001\ndescription: \"phone <required>\"\ntable: customers\ncolumn: phone"),
            CheckType::Null,
            CheckStatus::Fail,
            5,
            2,
            CheckDetails::message("2 nulls, \"phone\""),
        ),
    ];
    let started_at = Local.with_ymd_and_hms(2024, 6, 2, 9, 30, 5).unwrap();
    RunReport::new(results, started_at, 1.25)
}
