// datacheck-core/src/application/evaluators/null.rs

use async_trait::async_trait;
use tracing::{info, warn};

use crate::application::evaluators::Evaluator;
use crate::domain::result::details::NullDetails;
use crate::domain::result::{CheckDetails, CheckResult, CheckStatus, CheckType, round_to};
use crate::domain::rule::params::NullParams;
use crate::domain::rule::{RuleDefinition, RuleFamily};
use crate::domain::sql;
use crate::error::DataCheckError;
use crate::ports::executor::{QueryExecutor, Row, value_as_u64};

/// Null ratio of a column against `max_null_ratio`.
pub struct NullEvaluator;

/// PASS up to `max`, WARNING up to twice `max`, FAIL beyond.
pub fn classify_null_ratio(ratio: f64, max: f64) -> CheckStatus {
    if ratio <= max {
        CheckStatus::Pass
    } else if ratio <= max * 2.0 {
        CheckStatus::Warning
    } else {
        CheckStatus::Fail
    }
}

#[async_trait]
impl Evaluator for NullEvaluator {
    fn family(&self) -> RuleFamily {
        RuleFamily::Null
    }

    async fn evaluate(
        &self,
        rule: &RuleDefinition,
        executor: &dyn QueryExecutor,
    ) -> Result<Vec<CheckResult>, DataCheckError> {
        let params: NullParams = rule.parse_params()?;
        info!(rule_id = %rule.rule_id, "{}", rule.description);

        let column = &params.column;
        let query = format!(
            "SELECT COUNT(*) AS total_rows, \
                    SUM(CASE WHEN {col} IS NULL THEN 1 ELSE 0 END) AS pure_null_count, \
                    SUM(CASE WHEN {col} IS NOT NULL AND TRIM({text}) = '' THEN 1 ELSE 0 END) AS empty_string_count \
             FROM {table}",
            col = column,
            text = sql::as_text(column),
            table = params.table,
        );
        let rows = executor.execute_query(&query, &[]).await?;
        let counts = rows.first();

        let total_rows = read_count(counts, "total_rows");
        if total_rows == 0 {
            warn!(rule_id = %rule.rule_id, table = %params.table, "Table is empty");
            return Ok(vec![CheckResult::new(
                rule,
                CheckType::Null,
                CheckStatus::Warning,
                0,
                0,
                CheckDetails::message(format!("Table {} is empty", params.table)),
            )]);
        }

        let pure_null_count = read_count(counts, "pure_null_count");
        let empty_string_count = read_count(counts, "empty_string_count");
        let null_count = if params.include_empty_string {
            pure_null_count + empty_string_count
        } else {
            pure_null_count
        };

        let ratio = null_count as f64 / total_rows as f64;
        let status = classify_null_ratio(ratio, params.max_null_ratio);

        if params.include_empty_string && empty_string_count > 0 {
            info!(
                rule_id = %rule.rule_id,
                empty_string_count,
                "Empty strings counted as null"
            );
        }
        info!(rule_id = %rule.rule_id, null_count, total_rows, status = %status, "Null ratio checked");

        let details = CheckDetails::Null(NullDetails {
            max_null_ratio: params.max_null_ratio,
            actual_null_ratio: round_to(ratio, 6),
            include_empty_string: params.include_empty_string,
            pure_null_count: params.include_empty_string.then_some(pure_null_count),
            empty_string_count: params.include_empty_string.then_some(empty_string_count),
        });

        Ok(vec![CheckResult::new(
            rule,
            CheckType::Null,
            status,
            total_rows,
            null_count,
            details,
        )])
    }
}

fn read_count(row: Option<&Row>, column: &str) -> u64 {
    row.and_then(|r| r.get(column))
        .and_then(value_as_u64)
        .unwrap_or(0)
}
