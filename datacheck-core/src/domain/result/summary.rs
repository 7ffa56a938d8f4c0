// datacheck-core/src/domain/result/summary.rs

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::domain::result::check_result::{CheckResult, round_to};
use crate::domain::result::status::CheckStatus;

/// Status roll-up of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub total_checks: usize,
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
    pub errors: usize,
    /// Percentage of PASS results, 2 decimals.
    pub pass_rate: f64,
}

impl RunSummary {
    pub fn from_results(results: &[CheckResult]) -> Self {
        let mut summary = Self {
            total_checks: results.len(),
            ..Self::default()
        };

        for result in results {
            match result.status() {
                CheckStatus::Pass => summary.passed += 1,
                CheckStatus::Warning => summary.warnings += 1,
                CheckStatus::Fail => summary.failed += 1,
                CheckStatus::Error => summary.errors += 1,
            }
        }

        if summary.total_checks > 0 {
            let rate = summary.passed as f64 / summary.total_checks as f64 * 100.0;
            summary.pass_rate = round_to(rate, 2);
        }
        summary
    }

    /// No FAIL and no ERROR. Warnings do not break a run.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

/// Everything a run hands to the reporters.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Local>,
    pub elapsed_secs: f64,
    pub summary: RunSummary,
    pub results: Vec<CheckResult>,
}

impl RunReport {
    pub fn new(results: Vec<CheckResult>, started_at: DateTime<Local>, elapsed_secs: f64) -> Self {
        Self {
            started_at,
            elapsed_secs,
            summary: RunSummary::from_results(&results),
            results,
        }
    }
}
