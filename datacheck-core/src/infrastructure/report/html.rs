// datacheck-core/src/infrastructure/report/html.rs

use minijinja::{Environment, context};
use serde::Serialize;

use crate::domain::result::{CheckResult, CheckStatus, RunReport, round_to};
use crate::infrastructure::error::InfrastructureError;

const TEMPLATE_NAME: &str = "report.html";
const TEMPLATE: &str = include_str!("templates/report.html");

#[derive(Serialize)]
struct Section<'a> {
    check_type: &'a str,
    results: Vec<Row<'a>>,
}

#[derive(Serialize)]
struct Row<'a> {
    rule_id: &'a str,
    description: &'a str,
    table_name: &'a str,
    column_name: Option<&'a str>,
    status: &'static str,
    total_rows: u64,
    violation_count: u64,
    violation_ratio: String,
    details_json: String,
}

#[derive(Serialize)]
struct Bar {
    class: &'static str,
    label: &'static str,
    width: f64,
}

pub fn render(report: &RunReport) -> Result<String, InfrastructureError> {
    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, TEMPLATE)?;
    let template = env.get_template(TEMPLATE_NAME)?;

    let sections = group_by_check_type(&report.results)?;

    let rendered = template.render(context! {
        generated_at => report.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        elapsed_secs => round_to(report.elapsed_secs, 2),
        summary => &report.summary,
        progress => progress_bars(report),
        sections => sections,
        version => env!("CARGO_PKG_VERSION"),
    })?;

    Ok(rendered)
}

/// Sections in first-seen order of their check type.
fn group_by_check_type(results: &[CheckResult]) -> Result<Vec<Section<'_>>, InfrastructureError> {
    let mut sections: Vec<Section<'_>> = Vec::new();

    for result in results {
        let row = Row {
            rule_id: result.rule_id(),
            description: result.description(),
            table_name: result.table_name(),
            column_name: result.column_name(),
            status: result.status().as_str(),
            total_rows: result.total_rows(),
            violation_count: result.violation_count(),
            violation_ratio: format!("{:.4}", result.violation_ratio()),
            details_json: serde_json::to_string_pretty(result.details())?,
        };

        match sections
            .iter_mut()
            .find(|s| s.check_type == result.check_type())
        {
            Some(section) => section.results.push(row),
            None => sections.push(Section {
                check_type: result.check_type(),
                results: vec![row],
            }),
        }
    }

    Ok(sections)
}

fn progress_bars(report: &RunReport) -> Vec<Bar> {
    let s = &report.summary;
    if s.total_checks == 0 {
        return Vec::new();
    }
    let width = |n: usize| round_to(n as f64 / s.total_checks as f64 * 100.0, 2);

    [
        (CheckStatus::Pass, s.passed),
        (CheckStatus::Warning, s.warnings),
        (CheckStatus::Fail, s.failed),
        (CheckStatus::Error, s.errors),
    ]
    .into_iter()
    .filter(|(_, n)| *n > 0)
    .map(|(status, n)| Bar {
        class: match status {
            CheckStatus::Pass => "pass",
            CheckStatus::Warning => "warning",
            CheckStatus::Fail => "fail",
            CheckStatus::Error => "error",
        },
        label: status.as_str(),
        width: width(n),
    })
    .collect()
}
