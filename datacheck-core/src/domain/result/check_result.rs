// datacheck-core/src/domain/result/check_result.rs

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::fmt::Display;

use crate::domain::result::details::CheckDetails;
use crate::domain::result::status::{CheckStatus, CheckType};
use crate::domain::rule::RuleDefinition;

/// Outcome of one rule evaluation. Built once, never mutated.
///
/// Serializes to the flat interchange record consumed by the reporters:
/// `violation_ratio` rounded to 6 decimals, `executed_at` as ISO-8601.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    rule_id: String,
    check_type: String,
    description: String,
    table_name: String,
    column_name: Option<String>,
    status: CheckStatus,
    total_rows: u64,
    violation_count: u64,
    #[serde(serialize_with = "serialize_ratio")]
    violation_ratio: f64,
    details: CheckDetails,
    executed_at: DateTime<Local>,
}

impl CheckResult {
    pub fn new(
        rule: &RuleDefinition,
        check_type: CheckType,
        status: CheckStatus,
        total_rows: u64,
        violation_count: u64,
        details: CheckDetails,
    ) -> Self {
        Self::build(
            rule,
            check_type.as_str().to_string(),
            status,
            total_rows,
            violation_count,
            details,
        )
    }

    /// ERROR result carrying the failure text. `check_type` is free-form so a
    /// rule whose family could not be resolved can still be reported.
    pub fn error(rule: &RuleDefinition, check_type: &str, error: &dyn Display) -> Self {
        Self::build(
            rule,
            check_type.to_string(),
            CheckStatus::Error,
            0,
            0,
            CheckDetails::Error {
                error: error.to_string(),
            },
        )
    }

    fn build(
        rule: &RuleDefinition,
        check_type: String,
        status: CheckStatus,
        total_rows: u64,
        violation_count: u64,
        details: CheckDetails,
    ) -> Self {
        let violation_ratio = if total_rows > 0 {
            violation_count as f64 / total_rows as f64
        } else {
            0.0
        };

        Self {
            rule_id: rule.rule_id.clone(),
            check_type,
            description: rule.description.clone(),
            table_name: rule.table_name(),
            column_name: rule.column_name(),
            status,
            total_rows,
            violation_count,
            violation_ratio,
            details,
            executed_at: Local::now(),
        }
    }

    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }
    pub fn check_type(&self) -> &str {
        &self.check_type
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
    pub fn column_name(&self) -> Option<&str> {
        self.column_name.as_deref()
    }
    pub fn status(&self) -> CheckStatus {
        self.status
    }
    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }
    pub fn violation_count(&self) -> u64 {
        self.violation_count
    }
    pub fn violation_ratio(&self) -> f64 {
        self.violation_ratio
    }
    pub fn details(&self) -> &CheckDetails {
        &self.details
    }
    pub fn executed_at(&self) -> DateTime<Local> {
        self.executed_at
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn serialize_ratio<S: Serializer>(ratio: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*ratio, 6))
}
