// datacheck-core/src/application/evaluators/count.rs

use async_trait::async_trait;
use tracing::info;

use crate::application::evaluators::Evaluator;
use crate::domain::counting::{ChunkedCountPolicy, CountStrategy, count_from_query};
use crate::domain::result::details::CountDetails;
use crate::domain::result::{CheckDetails, CheckResult, CheckStatus, CheckType, round_to};
use crate::domain::rule::params::{CountParams, CountSource};
use crate::domain::rule::{RuleDefinition, RuleFamily};
use crate::error::DataCheckError;
use crate::ports::executor::QueryExecutor;

/// Source/target row count parity.
pub struct CountEvaluator {
    policy: ChunkedCountPolicy,
}

impl CountEvaluator {
    pub fn new(policy: ChunkedCountPolicy) -> Self {
        Self { policy }
    }
}

impl Default for CountEvaluator {
    fn default() -> Self {
        Self::new(ChunkedCountPolicy::default())
    }
}

/// `|s - t| / s`. An empty source is 0 against an empty target, 1.0 otherwise.
pub fn count_diff_ratio(source: u64, target: u64) -> f64 {
    if source == 0 {
        return if target == 0 { 0.0 } else { 1.0 };
    }
    source.abs_diff(target) as f64 / source as f64
}

#[async_trait]
impl Evaluator for CountEvaluator {
    fn family(&self) -> RuleFamily {
        RuleFamily::Count
    }

    async fn evaluate(
        &self,
        rule: &RuleDefinition,
        executor: &dyn QueryExecutor,
    ) -> Result<Vec<CheckResult>, DataCheckError> {
        let params: CountParams = rule.parse_params()?;
        info!(rule_id = %rule.rule_id, "{}", rule.description);

        let ((source_count, source_strategy), (target_count, target_strategy)) =
            match params.source(&rule.rule_id)? {
                CountSource::Queries { source, target } => (
                    (count_from_query(executor, source).await?, CountStrategy::CustomQuery),
                    (count_from_query(executor, target).await?, CountStrategy::CustomQuery),
                ),
                CountSource::Tables { source, target } => {
                    let filter = params.where_clause.as_deref();
                    (
                        self.policy
                            .count(executor, source, &params.primary_key, filter)
                            .await?,
                        self.policy
                            .count(executor, target, &params.primary_key, filter)
                            .await?,
                    )
                }
            };

        let diff_ratio = count_diff_ratio(source_count, target_count);
        let status = CheckStatus::pass_if(diff_ratio <= params.threshold);

        info!(
            rule_id = %rule.rule_id,
            source_count,
            target_count,
            diff_ratio,
            status = %status,
            "Count compared"
        );

        let details = CheckDetails::Count(CountDetails {
            source_table: params.source_table.clone(),
            target_table: params.target_table.clone(),
            source_count,
            target_count,
            diff_ratio: round_to(diff_ratio, 6),
            threshold: params.threshold,
            where_clause: params.where_clause.clone(),
            source_strategy,
            target_strategy,
        });

        Ok(vec![CheckResult::new(
            rule,
            CheckType::Count,
            status,
            source_count,
            source_count.abs_diff(target_count),
            details,
        )])
    }
}
