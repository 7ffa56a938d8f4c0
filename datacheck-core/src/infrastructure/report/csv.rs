// datacheck-core/src/infrastructure/report/csv.rs

// Flat export for follow-up analysis: one row per result in a fixed column
// order, `details` as JSON text, then a blank row and a summary row.

use ::csv::WriterBuilder;

use crate::domain::result::RunReport;
use crate::infrastructure::error::InfrastructureError;

pub const COLUMNS: [&str; 11] = [
    "rule_id",
    "check_type",
    "description",
    "table_name",
    "column_name",
    "status",
    "total_rows",
    "violation_count",
    "violation_ratio",
    "details",
    "executed_at",
];

pub fn render(report: &RunReport) -> Result<String, InfrastructureError> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
    writer.write_record(COLUMNS)?;

    for result in &report.results {
        let details = serde_json::to_string(result.details())?;
        writer.write_record([
            result.rule_id().to_string(),
            result.check_type().to_string(),
            result.description().to_string(),
            result.table_name().to_string(),
            result.column_name().unwrap_or_default().to_string(),
            result.status().to_string(),
            result.total_rows().to_string(),
            result.violation_count().to_string(),
            format!("{:.6}", result.violation_ratio()),
            details,
            result.executed_at().to_rfc3339(),
        ])?;
    }

    let s = &report.summary;
    writer.write_record([""])?;
    writer.write_record([
        "SUMMARY".to_string(),
        "-".to_string(),
        format!(
            "total {} | PASS {} | FAIL {} | WARNING {} | ERROR {}",
            s.total_checks, s.passed, s.failed, s.warnings, s.errors
        ),
        String::new(),
        String::new(),
        format!("pass rate {}%", s.pass_rate),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        report.started_at.to_rfc3339(),
    ])?;

    let bytes = writer
        .into_inner()
        .map_err(|e| InfrastructureError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| InfrastructureError::ConfigError(e.to_string()))
}
