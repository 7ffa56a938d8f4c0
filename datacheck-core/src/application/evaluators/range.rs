// datacheck-core/src/application/evaluators/range.rs

// Value bounds on a column, plus the referential (foreign key) check which
// shares the rule file. `total_rows` is always the non-null value count.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tracing::info;

use crate::application::evaluators::{Evaluator, SAMPLE_LIMIT};
use crate::domain::error::DomainError;
use crate::domain::result::details::{
    DateRangeDetails, ForeignKeyDetails, NoFutureDetails, NumericRangeDetails,
};
use crate::domain::result::{CheckDetails, CheckResult, CheckStatus, CheckType};
use crate::domain::rule::params::{RangeMode, RangeParams};
use crate::domain::rule::{RuleDefinition, RuleFamily};
use crate::domain::sql;
use crate::error::DataCheckError;
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::executor::{QueryExecutor, Row, Value, value_as_u64, value_to_key};

pub struct RangeEvaluator {
    clock: Arc<dyn Clock>,
}

impl RangeEvaluator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Default for RangeEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

/// Aggregates shared by the bound checks.
struct BoundStats {
    total_rows: u64,
    violation_count: u64,
    actual_min: Option<String>,
    actual_max: Option<String>,
}

#[async_trait]
impl Evaluator for RangeEvaluator {
    fn family(&self) -> RuleFamily {
        RuleFamily::Range
    }

    fn check_type(&self, rule: &RuleDefinition) -> CheckType {
        let mode = rule
            .params
            .get("check_type")
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse::<RangeMode>().ok());
        match mode {
            Some(RangeMode::ForeignKey) => CheckType::ForeignKey,
            _ => CheckType::Range,
        }
    }

    async fn evaluate(
        &self,
        rule: &RuleDefinition,
        executor: &dyn QueryExecutor,
    ) -> Result<Vec<CheckResult>, DataCheckError> {
        let params: RangeParams = rule.parse_params()?;
        let mode = params.mode(&rule.rule_id)?;
        info!(rule_id = %rule.rule_id, mode = %mode, "{}", rule.description);

        let result = match mode {
            RangeMode::Range | RangeMode::Positive => {
                self.numeric_range(rule, &params, mode, executor).await?
            }
            RangeMode::DateRange => self.date_range(rule, &params, executor).await?,
            RangeMode::NoFuture => self.no_future(rule, &params, executor).await?,
            RangeMode::ForeignKey => self.foreign_key(rule, &params, executor).await?,
        };

        info!(
            rule_id = %rule.rule_id,
            violations = result.violation_count(),
            status = %result.status(),
            "Range checked"
        );
        Ok(vec![result])
    }
}

impl RangeEvaluator {
    async fn numeric_range(
        &self,
        rule: &RuleDefinition,
        params: &RangeParams,
        mode: RangeMode,
        executor: &dyn QueryExecutor,
    ) -> Result<CheckResult, DataCheckError> {
        let min_value = match mode {
            RangeMode::Positive => params.min_value.or(Some(0.0)),
            _ => params.min_value,
        };
        let col = &params.column;

        let mut conditions = Vec::new();
        if let Some(min) = min_value {
            conditions.push(format!("{} < {}", col, sql::number_literal(min)));
        }
        if let Some(max) = params.max_value {
            conditions.push(format!("{} > {}", col, sql::number_literal(max)));
        }

        let stats = bound_stats(executor, &params.table, col, &conditions).await?;
        let details = CheckDetails::NumericRange(NumericRangeDetails {
            expected_min: min_value,
            expected_max: params.max_value,
            actual_min: stats.actual_min,
            actual_max: stats.actual_max,
        });

        Ok(CheckResult::new(
            rule,
            CheckType::Range,
            CheckStatus::pass_if(stats.violation_count == 0),
            stats.total_rows,
            stats.violation_count,
            details,
        ))
    }

    async fn date_range(
        &self,
        rule: &RuleDefinition,
        params: &RangeParams,
        executor: &dyn QueryExecutor,
    ) -> Result<CheckResult, DataCheckError> {
        let col = &params.column;

        let mut conditions = Vec::new();
        if let Some(min) = &params.min_date {
            let literal = date_literal(&rule.rule_id, "min_date", min)?;
            conditions.push(format!("{} < {}", col, literal));
        }
        if let Some(max) = &params.max_date {
            let literal = date_literal(&rule.rule_id, "max_date", max)?;
            conditions.push(format!("{} > {}", col, literal));
        }

        let stats = bound_stats(executor, &params.table, col, &conditions).await?;
        let details = CheckDetails::DateRange(DateRangeDetails {
            min_date: params.min_date.clone(),
            max_date: params.max_date.clone(),
            actual_min: stats.actual_min,
            actual_max: stats.actual_max,
        });

        Ok(CheckResult::new(
            rule,
            CheckType::Range,
            CheckStatus::pass_if(stats.violation_count == 0),
            stats.total_rows,
            stats.violation_count,
            details,
        ))
    }

    async fn no_future(
        &self,
        rule: &RuleDefinition,
        params: &RangeParams,
        executor: &dyn QueryExecutor,
    ) -> Result<CheckResult, DataCheckError> {
        let now = self.clock.now().format("%Y-%m-%d %H:%M:%S").to_string();
        let condition = format!(
            "{} > CAST({} AS TIMESTAMP)",
            params.column,
            sql::quote_literal(&now)
        );

        let stats = bound_stats(executor, &params.table, &params.column, &[condition]).await?;
        let details = CheckDetails::NoFuture(NoFutureDetails {
            check: "no_future_date",
            reference_time: now,
            actual_max: stats.actual_max,
        });

        Ok(CheckResult::new(
            rule,
            CheckType::Range,
            CheckStatus::pass_if(stats.violation_count == 0),
            stats.total_rows,
            stats.violation_count,
            details,
        ))
    }

    async fn foreign_key(
        &self,
        rule: &RuleDefinition,
        params: &RangeParams,
        executor: &dyn QueryExecutor,
    ) -> Result<CheckResult, DataCheckError> {
        let parent_table = required(&rule.rule_id, "parent_table", &params.parent_table)?;
        let parent_column = required(&rule.rule_id, "parent_column", &params.parent_column)?;
        let (table, col) = (&params.table, &params.column);

        let total_rows = scalar_count(executor, &sql::count_non_null(table, col)).await?;

        let orphan_filter = format!(
            "FROM {table} c WHERE c.{col} IS NOT NULL \
             AND NOT EXISTS (SELECT 1 FROM {parent_table} p WHERE p.{parent_column} = c.{col})"
        );
        let orphan_count = scalar_count(executor, &format!("SELECT COUNT(*) {orphan_filter}")).await?;

        let orphan_samples = if orphan_count > 0 {
            let sample_query = format!(
                "SELECT DISTINCT c.{col} AS orphan {orphan_filter} ORDER BY 1 LIMIT {SAMPLE_LIMIT}"
            );
            executor
                .execute_query(&sample_query, &[])
                .await?
                .into_iter()
                .filter_map(|mut row| row.remove("orphan"))
                .collect()
        } else {
            Vec::new()
        };

        let details = CheckDetails::ForeignKey(ForeignKeyDetails {
            parent_table: parent_table.to_string(),
            parent_column: parent_column.to_string(),
            orphan_count,
            orphan_samples,
        });

        Ok(CheckResult::new(
            rule,
            CheckType::ForeignKey,
            CheckStatus::pass_if(orphan_count == 0),
            total_rows,
            orphan_count,
            details,
        ))
    }
}

/// One pass: non-null count, violations of any `conditions`, observed min/max.
async fn bound_stats(
    executor: &dyn QueryExecutor,
    table: &str,
    column: &str,
    conditions: &[String],
) -> Result<BoundStats, DataCheckError> {
    let violation = if conditions.is_empty() {
        "FALSE".to_string()
    } else {
        conditions.join(" OR ")
    };
    let query = format!(
        "SELECT COUNT({column}) AS total_rows, \
                SUM(CASE WHEN {column} IS NOT NULL AND ({violation}) THEN 1 ELSE 0 END) AS violation_count, \
                MIN({column}) AS actual_min, \
                MAX({column}) AS actual_max \
         FROM {table}"
    );

    let rows = executor.execute_query(&query, &[]).await?;
    let row = rows.first();
    let count = |name: &str| cell(row, name).and_then(value_as_u64).unwrap_or(0);
    let text = |name: &str| {
        cell(row, name)
            .filter(|v| !v.is_null())
            .map(value_to_key)
    };

    Ok(BoundStats {
        total_rows: count("total_rows"),
        violation_count: count("violation_count"),
        actual_min: text("actual_min"),
        actual_max: text("actual_max"),
    })
}

fn cell<'a>(row: Option<&'a Row>, name: &str) -> Option<&'a Value> {
    row.and_then(|r| r.get(name))
}

async fn scalar_count(executor: &dyn QueryExecutor, query: &str) -> Result<u64, DataCheckError> {
    let value = executor.execute_scalar(query, &[]).await?;
    Ok(value.as_ref().and_then(value_as_u64).unwrap_or(0))
}

/// Quoted SQL literal for a configured date (`YYYY-MM-DD`) or timestamp
/// (`YYYY-MM-DD HH:MM:SS`). Anything else is rejected before it reaches SQL.
fn date_literal(rule_id: &str, field: &str, raw: &str) -> Result<String, DomainError> {
    let raw = raw.trim();
    if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok() {
        return Ok(format!("CAST({} AS DATE)", sql::quote_literal(raw)));
    }
    if NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").is_ok() {
        return Ok(format!("CAST({} AS TIMESTAMP)", sql::quote_literal(raw)));
    }
    Err(DomainError::UnexpectedValue {
        rule_id: rule_id.to_string(),
        field: field.to_string(),
        message: format!("'{}' is not a date (YYYY-MM-DD[ HH:MM:SS])", raw),
    })
}

fn required<'a>(
    rule_id: &str,
    field: &str,
    value: &'a Option<String>,
) -> Result<&'a str, DomainError> {
    value.as_deref().ok_or_else(|| DomainError::InvalidRule {
        rule_id: rule_id.to_string(),
        message: format!("missing field `{}` for foreign_key check", field),
    })
}
