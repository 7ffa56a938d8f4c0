// datacheck-core/src/application/evaluators/masking.rs

// De-identification checks by fixed-offset substring comparison. Positions
// are 1-based, as in SQL SUBSTRING. Only non-null values are inspected.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::application::evaluators::{Evaluator, SAMPLE_LIMIT};
use crate::domain::result::details::MaskingDetails;
use crate::domain::result::{CheckDetails, CheckResult, CheckStatus, CheckType};
use crate::domain::rule::params::{MaskingParams, MaskingType};
use crate::domain::rule::{RuleDefinition, RuleFamily};
use crate::domain::sql;
use crate::error::DataCheckError;
use crate::ports::executor::{QueryExecutor, value_as_u64};

const SSN_MASK: &str = "*******";
const SSN_MASK_START: u32 = 8;
const SSN_LENGTH: u32 = 14;
const PHONE_MASK: &str = "****";
const PHONE_MASK_START: u32 = 5;
const HASH_LENGTH: u32 = 64;

pub struct MaskingEvaluator;

/// What a violating value looks like, as a SQL predicate over the text value.
struct MaskingCheck {
    violation: String,
    expected_format: String,
    expected_length: Option<u32>,
}

impl MaskingCheck {
    fn build(kind: MaskingType, params: &MaskingParams) -> Self {
        let text = sql::as_text(&params.column);
        let mask = |default: &str| {
            params
                .expected_pattern_value
                .clone()
                .unwrap_or_else(|| default.to_string())
        };
        let start = |default: u32| params.expected_pattern_start.unwrap_or(default);
        let length = |default: u32| params.expected_length.unwrap_or(default);

        // Only the mask-length window at `start` is compared; characters after
        // it are not constrained.
        let masked_region = |start: u32, mask: &str| {
            format!(
                "SUBSTRING({}, {}, {}) = {}",
                text,
                start,
                mask.chars().count(),
                sql::quote_literal(mask)
            )
        };

        match kind {
            MaskingType::Ssn => {
                let (mask, start, length) = (mask(SSN_MASK), start(SSN_MASK_START), length(SSN_LENGTH));
                Self {
                    violation: format!(
                        "NOT (LENGTH({}) = {} AND {})",
                        text,
                        length,
                        masked_region(start, &mask)
                    ),
                    expected_format: format!("length {}, '{}' from position {}", length, mask, start),
                    expected_length: Some(length),
                }
            }
            MaskingType::Phone => {
                let (mask, start) = (mask(PHONE_MASK), start(PHONE_MASK_START));
                Self {
                    violation: format!("NOT ({})", masked_region(start, &mask)),
                    expected_format: format!("'{}' from position {}", mask, start),
                    expected_length: None,
                }
            }
            MaskingType::Hash => {
                let length = length(HASH_LENGTH);
                Self {
                    violation: format!(
                        "NOT (LENGTH({text}) = {length} AND LTRIM(LOWER({text}), '0123456789abcdef') = '')"
                    ),
                    expected_format: format!("{} hex characters", length),
                    expected_length: Some(length),
                }
            }
            MaskingType::LeakCheck => {
                let (mask, start, length) = (mask(SSN_MASK), start(SSN_MASK_START), length(SSN_LENGTH));
                Self {
                    violation: format!(
                        "LENGTH({}) = {} AND NOT ({})",
                        text,
                        length,
                        masked_region(start, &mask)
                    ),
                    expected_format: format!(
                        "no length-{} value without '{}' from position {}",
                        length, mask, start
                    ),
                    expected_length: Some(length),
                }
            }
        }
    }
}

#[async_trait]
impl Evaluator for MaskingEvaluator {
    fn family(&self) -> RuleFamily {
        RuleFamily::Masking
    }

    async fn evaluate(
        &self,
        rule: &RuleDefinition,
        executor: &dyn QueryExecutor,
    ) -> Result<Vec<CheckResult>, DataCheckError> {
        let params: MaskingParams = rule.parse_params()?;
        let kind = params.masking_type(&rule.rule_id)?;
        info!(rule_id = %rule.rule_id, masking_type = kind.as_str(), "{}", rule.description);

        let check = MaskingCheck::build(kind, &params);
        let (table, col) = (&params.table, &params.column);

        let total_rows = count(executor, &sql::count_non_null(table, col)).await?;

        let filter = format!("FROM {table} WHERE {col} IS NOT NULL AND ({})", check.violation);
        let violation_count = count(executor, &format!("SELECT COUNT(*) {filter}")).await?;

        let violation_samples = if violation_count > 0 {
            let sample_query =
                format!("SELECT {col} AS sample {filter} ORDER BY 1 LIMIT {SAMPLE_LIMIT}");
            executor
                .execute_query(&sample_query, &[])
                .await?
                .into_iter()
                .filter_map(|mut row| row.remove("sample"))
                .collect()
        } else {
            Vec::new()
        };

        let severity = match kind {
            MaskingType::LeakCheck => {
                if violation_count > 0 {
                    warn!(
                        rule_id = %rule.rule_id,
                        table = %table,
                        column = %col,
                        violation_count,
                        "🚨 Unmasked personal data found"
                    );
                }
                Some("critical")
            }
            _ => None,
        };

        let status = CheckStatus::pass_if(violation_count == 0);
        info!(rule_id = %rule.rule_id, violation_count, total_rows, status = %status, "Masking checked");

        let details = CheckDetails::Masking(MaskingDetails {
            masking_type: kind.as_str(),
            expected_format: check.expected_format,
            expected_length: check.expected_length,
            severity,
            violation_samples,
        });

        Ok(vec![CheckResult::new(
            rule,
            CheckType::Masking,
            status,
            total_rows,
            violation_count,
            details,
        )])
    }
}

async fn count(executor: &dyn QueryExecutor, query: &str) -> Result<u64, DataCheckError> {
    let value = executor.execute_scalar(query, &[]).await?;
    Ok(value.as_ref().and_then(value_as_u64).unwrap_or(0))
}
