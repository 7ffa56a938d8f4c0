// datacheck-core/src/application/evaluators/mod.rs

pub mod count;
pub mod duplicate;
pub mod masking;
pub mod null;
pub mod range;
pub mod transform;

#[cfg(test)]
pub(crate) mod fixture;

use async_trait::async_trait;

use crate::domain::result::{CheckResult, CheckType};
use crate::domain::rule::{RuleDefinition, RuleFamily};
use crate::error::DataCheckError;
use crate::ports::executor::QueryExecutor;

pub use count::CountEvaluator;
pub use duplicate::DuplicateEvaluator;
pub use masking::MaskingEvaluator;
pub use null::NullEvaluator;
pub use range::RangeEvaluator;
pub use transform::TransformEvaluator;

/// Evidence lists (duplicate keys, orphans, mismatches) are capped at this size.
pub const SAMPLE_LIMIT: usize = 5;

/// One implementation per rule family.
#[async_trait]
pub trait Evaluator: Send + Sync {
    fn family(&self) -> RuleFamily;

    /// Check type reported for this rule, including on ERROR results.
    fn check_type(&self, _rule: &RuleDefinition) -> CheckType {
        self.family().default_check_type()
    }

    async fn evaluate(
        &self,
        rule: &RuleDefinition,
        executor: &dyn QueryExecutor,
    ) -> Result<Vec<CheckResult>, DataCheckError>;
}
