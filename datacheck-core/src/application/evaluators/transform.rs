// datacheck-core/src/application/evaluators/transform.rs

// Source/target reconciliation over two arbitrary queries.
//
//   aggregate  one value per side, relative difference against `tolerance`
//   join       per-key values, absolute difference against `tolerance`
//   existence  every source key must exist in the target; extra target
//              keys are reported but never counted as violations

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

use crate::application::evaluators::{Evaluator, SAMPLE_LIMIT};
use crate::domain::error::DomainError;
use crate::domain::result::details::{
    AggregateDetails, ExistenceDetails, JoinCompareDetails, ValueMismatch,
};
use crate::domain::result::{CheckDetails, CheckResult, CheckStatus, CheckType, round_to};
use crate::domain::rule::params::{TransformMode, TransformParams};
use crate::domain::rule::{RuleDefinition, RuleFamily};
use crate::error::DataCheckError;
use crate::ports::executor::{QueryExecutor, Row, Value, value_as_f64, value_to_key};

pub struct TransformEvaluator;

#[async_trait]
impl Evaluator for TransformEvaluator {
    fn family(&self) -> RuleFamily {
        RuleFamily::Transform
    }

    async fn evaluate(
        &self,
        rule: &RuleDefinition,
        executor: &dyn QueryExecutor,
    ) -> Result<Vec<CheckResult>, DataCheckError> {
        let params: TransformParams = rule.parse_params()?;
        let mode = params.mode(&rule.rule_id)?;
        info!(rule_id = %rule.rule_id, mode = ?mode, "{}", rule.description);

        let source_rows = executor.execute_query(&params.source_query, &[]).await?;
        let target_rows = executor.execute_query(&params.target_query, &[]).await?;

        let result = match mode {
            TransformMode::Aggregate => aggregate(rule, &params, &source_rows, &target_rows)?,
            TransformMode::Join => join(rule, &params, &source_rows, &target_rows)?,
            TransformMode::Existence => existence(rule, &params, &source_rows, &target_rows)?,
        };

        info!(
            rule_id = %rule.rule_id,
            total = result.total_rows(),
            violations = result.violation_count(),
            status = %result.status(),
            "Transform compared"
        );
        Ok(vec![result])
    }
}

fn aggregate(
    rule: &RuleDefinition,
    params: &TransformParams,
    source_rows: &[Row],
    target_rows: &[Row],
) -> Result<CheckResult, DomainError> {
    let compare_column = params.require_compare_column(&rule.rule_id)?;

    let warning = |message: &str| {
        warn!(rule_id = %rule.rule_id, "{}", message);
        CheckResult::new(
            rule,
            CheckType::Transform,
            CheckStatus::Warning,
            0,
            0,
            CheckDetails::message(message),
        )
    };

    let (Some(source_row), Some(target_row)) = (source_rows.first(), target_rows.first()) else {
        return Ok(warning("Source or target result is empty"));
    };
    let source = source_row.get(compare_column).filter(|v| !v.is_null());
    let target = target_row.get(compare_column).filter(|v| !v.is_null());
    let (Some(source), Some(target)) = (source, target) else {
        return Ok(warning(&format!(
            "Source or target value of '{}' is null",
            compare_column
        )));
    };

    let source = numeric(rule, compare_column, source)?;
    let target = numeric(rule, compare_column, target)?;

    let difference = (source - target).abs();
    let (diff_ratio, status) = if source == 0.0 {
        let same = target == 0.0;
        (if same { 0.0 } else { 1.0 }, CheckStatus::pass_if(same))
    } else {
        let ratio = difference / source.abs();
        (ratio, CheckStatus::pass_if(ratio <= params.tolerance))
    };

    let details = CheckDetails::Aggregate(AggregateDetails {
        compare_column: compare_column.to_string(),
        source_value: source,
        target_value: target,
        difference,
        diff_ratio: round_to(diff_ratio, 6),
        tolerance: params.tolerance,
    });

    Ok(CheckResult::new(rule, CheckType::Transform, status, 0, 0, details))
}

fn join(
    rule: &RuleDefinition,
    params: &TransformParams,
    source_rows: &[Row],
    target_rows: &[Row],
) -> Result<CheckResult, DomainError> {
    let join_key = params.require_join_key(&rule.rule_id)?;
    let compare_column = params.require_compare_column(&rule.rule_id)?;

    let source = values_by_key(rule, source_rows, join_key, compare_column)?;
    let target = values_by_key(rule, target_rows, join_key, compare_column)?;
    let keys: BTreeSet<&String> = source.keys().chain(target.keys()).collect();

    let mut missing_in_target = 0u64;
    let mut missing_in_source = 0u64;
    let mut value_mismatches = 0u64;
    let mut samples = Vec::new();

    for key in &keys {
        match (source.get(*key), target.get(*key)) {
            (Some(_), None) => missing_in_target += 1,
            (None, Some(_)) => missing_in_source += 1,
            (Some(s), Some(t)) => {
                if values_differ(s, t, params.tolerance) {
                    value_mismatches += 1;
                    if samples.len() < SAMPLE_LIMIT {
                        samples.push(ValueMismatch {
                            key: (*key).clone(),
                            source_value: s.clone(),
                            target_value: t.clone(),
                        });
                    }
                }
            }
            (None, None) => {}
        }
    }

    let violations = missing_in_target + missing_in_source + value_mismatches;
    let details = CheckDetails::JoinCompare(JoinCompareDetails {
        join_key: join_key.to_string(),
        compare_column: compare_column.to_string(),
        tolerance: params.tolerance,
        missing_in_target,
        missing_in_source,
        value_mismatches,
        value_mismatches_sample: samples,
    });

    Ok(CheckResult::new(
        rule,
        CheckType::Transform,
        CheckStatus::pass_if(violations == 0),
        keys.len() as u64,
        violations,
        details,
    ))
}

fn existence(
    rule: &RuleDefinition,
    params: &TransformParams,
    source_rows: &[Row],
    target_rows: &[Row],
) -> Result<CheckResult, DomainError> {
    let join_key = params.require_join_key(&rule.rule_id)?;

    let source = keys_of(rule, source_rows, join_key)?;
    let target = keys_of(rule, target_rows, join_key)?;

    let missing: Vec<&String> = source.difference(&target).collect();
    let extra = target.difference(&source).count() as u64;
    let violations = missing.len() as u64;

    if extra > 0 {
        info!(rule_id = %rule.rule_id, extra, "Target has keys absent from source");
    }

    let details = CheckDetails::Existence(ExistenceDetails {
        join_key: join_key.to_string(),
        source_count: source.len() as u64,
        target_count: target.len() as u64,
        missing_in_target: violations,
        missing_in_source: extra,
        missing_in_target_sample: missing.iter().take(SAMPLE_LIMIT).map(|k| (*k).clone()).collect(),
    });

    Ok(CheckResult::new(
        rule,
        CheckType::Transform,
        CheckStatus::pass_if(violations == 0),
        source.len() as u64,
        violations,
        details,
    ))
}

/// Both null: equal. One null: different. Numbers: absolute difference above
/// `tolerance`. Anything else: textual inequality.
fn values_differ(source: &Value, target: &Value, tolerance: f64) -> bool {
    match (source.is_null(), target.is_null()) {
        (true, true) => false,
        (true, false) | (false, true) => true,
        (false, false) => match (value_as_f64(source), value_as_f64(target)) {
            (Some(s), Some(t)) => (s - t).abs() > tolerance,
            _ => value_to_key(source) != value_to_key(target),
        },
    }
}

fn key_of(rule: &RuleDefinition, row: &Row, join_key: &str) -> Result<String, DomainError> {
    row.get(join_key)
        .map(value_to_key)
        .ok_or_else(|| DomainError::UnexpectedValue {
            rule_id: rule.rule_id.clone(),
            field: "join_key".to_string(),
            message: format!("column '{}' is not in the query result", join_key),
        })
}

fn values_by_key(
    rule: &RuleDefinition,
    rows: &[Row],
    join_key: &str,
    compare_column: &str,
) -> Result<BTreeMap<String, Value>, DomainError> {
    rows.iter()
        .map(|row| {
            let key = key_of(rule, row, join_key)?;
            let value = row.get(compare_column).cloned().unwrap_or(Value::Null);
            Ok((key, value))
        })
        .collect()
}

fn keys_of(
    rule: &RuleDefinition,
    rows: &[Row],
    join_key: &str,
) -> Result<BTreeSet<String>, DomainError> {
    rows.iter().map(|row| key_of(rule, row, join_key)).collect()
}

fn numeric(rule: &RuleDefinition, column: &str, value: &Value) -> Result<f64, DomainError> {
    value_as_f64(value).ok_or_else(|| DomainError::UnexpectedValue {
        rule_id: rule.rule_id.clone(),
        field: column.to_string(),
        message: format!("expected a number, got {}", value),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::evaluators::fixture::{card_db, rule};
    use crate::ports::testing::{ScriptedExecutor, row};
    use anyhow::Result;
    use serde_json::json;

    fn transform_rule(yaml: &str) -> RuleDefinition {
        rule(RuleFamily::Transform, yaml)
    }

    const SETTLEMENT: &str = "source_query: SELECT txn_id, amount FROM src_settlement\ntarget_query: SELECT txn_id, amount FROM tgt_settlement\n";

    #[tokio::test]
    async fn test_aggregate_tolerance() -> Result<()> {
        let db = card_db()?;
        let base = "source_query: SELECT 100 AS total\ntarget_query: SELECT 101 AS total\ncompare_column: total\n";

        let loose = transform_rule(&format!("rule_id: TRF-001\n{base}tolerance: 0.02"));
        let result = &TransformEvaluator.evaluate(&loose, &db).await?[0];
        assert_eq!(result.status(), CheckStatus::Pass);
        match result.details() {
            CheckDetails::Aggregate(d) => assert_eq!(d.diff_ratio, 0.01),
            other => panic!("unexpected details: {other:?}"),
        }

        let strict = transform_rule(&format!("rule_id: TRF-002\n{base}tolerance: 0.005"));
        let result = &TransformEvaluator.evaluate(&strict, &db).await?[0];
        assert_eq!(result.status(), CheckStatus::Fail);
        Ok(())
    }

    #[tokio::test]
    async fn test_aggregate_reads_first_row_of_each_side() -> Result<()> {
        let executor = ScriptedExecutor::new().with_rows(|sql| {
            let total = if sql.contains("src_daily") { 2500.5 } else { 2450.5 };
            Ok(vec![
                row(&[("day", json!("2024-06-01")), ("total", json!(total))]),
                row(&[("day", json!("2024-06-02")), ("total", json!(0))]),
            ])
        });
        let rule = transform_rule(
            "rule_id: TRF-011\nsource_query: SELECT day, total FROM src_daily\ntarget_query: SELECT day, total FROM tgt_daily\ncompare_column: total\ntolerance: 0.01",
        );

        let result = &TransformEvaluator.evaluate(&rule, &executor).await?[0];

        assert_eq!(result.status(), CheckStatus::Fail);
        match result.details() {
            CheckDetails::Aggregate(d) => {
                assert_eq!(d.source_value, 2500.5);
                assert_eq!(d.target_value, 2450.5);
                assert_eq!(d.difference, 50.0);
            }
            other => panic!("unexpected details: {other:?}"),
        }
        assert_eq!(executor.calls_containing("src_daily").len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_aggregate_zero_source() -> Result<()> {
        let db = card_db()?;
        let rule = transform_rule(
            "rule_id: TRF-003\nsource_query: SELECT 0 AS total\ntarget_query: SELECT 0 AS total\ncompare_column: total",
        );
        let result = &TransformEvaluator.evaluate(&rule, &db).await?[0];
        assert_eq!(result.status(), CheckStatus::Pass);

        let rule = transform_rule(
            "rule_id: TRF-004\nsource_query: SELECT 0 AS total\ntarget_query: SELECT 3 AS total\ncompare_column: total\ntolerance: 10",
        );
        let result = &TransformEvaluator.evaluate(&rule, &db).await?[0];
        assert_eq!(result.status(), CheckStatus::Fail);
        Ok(())
    }

    #[tokio::test]
    async fn test_aggregate_empty_or_null_is_warning() -> Result<()> {
        let db = card_db()?;
        let empty = transform_rule(
            "rule_id: TRF-005\nsource_query: SELECT amount FROM empty_transactions\ntarget_query: SELECT 1 AS amount\ncompare_column: amount",
        );
        let result = &TransformEvaluator.evaluate(&empty, &db).await?[0];
        assert_eq!(result.status(), CheckStatus::Warning);
        assert_eq!(result.total_rows(), 0);

        let null = transform_rule(
            "rule_id: TRF-006\nsource_query: SELECT SUM(amount) AS total FROM empty_transactions\ntarget_query: SELECT 1 AS total\ncompare_column: total",
        );
        let result = &TransformEvaluator.evaluate(&null, &db).await?[0];
        assert_eq!(result.status(), CheckStatus::Warning);
        Ok(())
    }

    #[tokio::test]
    async fn test_aggregate_text_value_is_an_error() -> Result<()> {
        let db = card_db()?;
        let rule = transform_rule(
            "rule_id: TRF-007\nsource_query: SELECT 'abc' AS total\ntarget_query: SELECT 1 AS total\ncompare_column: total",
        );
        let err = TransformEvaluator.evaluate(&rule, &db).await.unwrap_err();
        assert!(matches!(
            err,
            DataCheckError::Domain(DomainError::UnexpectedValue { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_join_compare() -> Result<()> {
        let db = card_db()?;
        let rule = transform_rule(&format!(
            "rule_id: TRF-008\n{SETTLEMENT}join_key: txn_id\ncompare_column: amount"
        ));

        let result = &TransformEvaluator.evaluate(&rule, &db).await?[0];

        assert_eq!(result.status(), CheckStatus::Fail);
        assert_eq!(result.total_rows(), 6);
        assert_eq!(result.violation_count(), 4);
        match result.details() {
            CheckDetails::JoinCompare(d) => {
                assert_eq!(d.missing_in_target, 1);
                assert_eq!(d.missing_in_source, 1);
                assert_eq!(d.value_mismatches, 2);
                assert_eq!(d.value_mismatches_sample[0].key, "2");
                assert_eq!(d.value_mismatches_sample[1].target_value, Value::Null);
            }
            other => panic!("unexpected details: {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_join_tolerance_is_absolute() -> Result<()> {
        let db = card_db()?;
        let rule = transform_rule(&format!(
            "rule_id: TRF-009\n{SETTLEMENT}join_key: txn_id\ncompare_column: amount\ntolerance: 1.0"
        ));

        let result = &TransformEvaluator.evaluate(&rule, &db).await?[0];

        assert_eq!(result.violation_count(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_existence_only_penalizes_missing_targets() -> Result<()> {
        let db = card_db()?;
        let rule = transform_rule(&format!(
            "rule_id: TRF-010\n{SETTLEMENT}join_key: txn_id\ncompare_type: existence"
        ));

        let result = &TransformEvaluator.evaluate(&rule, &db).await?[0];

        assert_eq!(result.status(), CheckStatus::Fail);
        assert_eq!(result.total_rows(), 5);
        assert_eq!(result.violation_count(), 1);
        match result.details() {
            CheckDetails::Existence(d) => {
                assert_eq!(d.missing_in_source, 1);
                assert_eq!(d.missing_in_target_sample, vec!["5".to_string()]);
            }
            other => panic!("unexpected details: {other:?}"),
        }

        // Reversed: target keys are a superset, only the extras differ.
        let reversed = transform_rule(
            "rule_id: TRF-011\nsource_query: SELECT txn_id FROM src_settlement WHERE txn_id <= 4\ntarget_query: SELECT txn_id FROM tgt_settlement\njoin_key: txn_id\ncompare_type: existence",
        );
        let result = &TransformEvaluator.evaluate(&reversed, &db).await?[0];
        assert_eq!(result.status(), CheckStatus::Pass);
        Ok(())
    }

    #[test]
    fn test_values_differ_rules() {
        assert!(!values_differ(&Value::Null, &Value::Null, 0.0));
        assert!(values_differ(&Value::Null, &json!(1), 0.0));
        assert!(!values_differ(&json!(10.0), &json!("10.4"), 0.5));
        assert!(values_differ(&json!("A"), &json!("B"), 100.0));
    }
}
