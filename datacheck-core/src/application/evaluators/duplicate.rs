// datacheck-core/src/application/evaluators/duplicate.rs

use async_trait::async_trait;
use tracing::info;

use crate::application::evaluators::{Evaluator, SAMPLE_LIMIT};
use crate::domain::result::details::{DuplicateDetails, DuplicateSample};
use crate::domain::result::{CheckDetails, CheckResult, CheckStatus, CheckType};
use crate::domain::rule::params::DuplicateParams;
use crate::domain::rule::{RuleDefinition, RuleFamily};
use crate::domain::sql;
use crate::error::DataCheckError;
use crate::ports::executor::{QueryExecutor, value_as_u64};

// Reserved alias, so it cannot shadow a key column of the same name.
const SAMPLE_COUNT: &str = "__duplicate_count";

/// Candidate key uniqueness. Rows with a NULL in any key column are ignored.
pub struct DuplicateEvaluator;

#[async_trait]
impl Evaluator for DuplicateEvaluator {
    fn family(&self) -> RuleFamily {
        RuleFamily::Duplicate
    }

    async fn evaluate(
        &self,
        rule: &RuleDefinition,
        executor: &dyn QueryExecutor,
    ) -> Result<Vec<CheckResult>, DataCheckError> {
        let params: DuplicateParams = rule.parse_params()?;
        info!(rule_id = %rule.rule_id, "{}", rule.description);

        let table = &params.table;
        let key = params.columns.join(", ");
        let not_null = sql::all_not_null(&params.columns);

        let total_rows = executor.execute_count(table, None).await?;

        let groups_query = format!(
            "SELECT COUNT(*) AS duplicate_groups, COALESCE(SUM(__dup_cnt - 1), 0) AS duplicate_rows \
             FROM (SELECT {key}, COUNT(*) AS __dup_cnt FROM {table} WHERE {not_null} \
                   GROUP BY {key} HAVING COUNT(*) > 1) dup",
        );
        let rows = executor.execute_query(&groups_query, &[]).await?;
        let read = |column: &str| {
            rows.first()
                .and_then(|r| r.get(column))
                .and_then(value_as_u64)
                .unwrap_or(0)
        };
        let duplicate_groups = read("duplicate_groups");
        let duplicate_rows = read("duplicate_rows");

        let samples = if duplicate_groups > 0 {
            let sample_query = format!(
                "SELECT {key}, COUNT(*) AS {SAMPLE_COUNT} FROM {table} WHERE {not_null} \
                 GROUP BY {key} HAVING COUNT(*) > 1 \
                 ORDER BY {SAMPLE_COUNT} DESC, {key} LIMIT {SAMPLE_LIMIT}",
            );
            executor
                .execute_query(&sample_query, &[])
                .await?
                .into_iter()
                .map(|mut row| {
                    let duplicate_count = row
                        .remove(SAMPLE_COUNT)
                        .as_ref()
                        .and_then(value_as_u64)
                        .unwrap_or(0);
                    DuplicateSample {
                        key: row,
                        duplicate_count,
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        let status = CheckStatus::pass_if(duplicate_rows == 0);
        info!(
            rule_id = %rule.rule_id,
            duplicate_groups,
            duplicate_rows,
            status = %status,
            "Duplicates checked"
        );

        let details = CheckDetails::Duplicate(DuplicateDetails {
            columns: params.columns.clone(),
            key_kind: params.key_kind.map(|k| k.as_str().to_string()),
            duplicate_groups,
            duplicate_rows,
            samples,
        });

        Ok(vec![CheckResult::new(
            rule,
            CheckType::Duplicate,
            status,
            total_rows,
            duplicate_rows,
            details,
        )])
    }
}
