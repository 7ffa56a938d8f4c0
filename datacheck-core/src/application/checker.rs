// datacheck-core/src/application/checker.rs

use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::application::evaluators::{
    CountEvaluator, DuplicateEvaluator, Evaluator, MaskingEvaluator, NullEvaluator,
    RangeEvaluator, TransformEvaluator,
};
use crate::domain::counting::ChunkedCountPolicy;
use crate::domain::error::DomainError;
use crate::domain::result::CheckResult;
use crate::domain::rule::{RuleDefinition, RuleFamily};
use crate::ports::clock::Clock;
use crate::ports::executor::QueryExecutor;

/// Routes each rule to its family's evaluator. Never fails: any error
/// becomes an ERROR result for the rule that caused it.
pub struct Checker {
    evaluators: Vec<Box<dyn Evaluator>>,
}

impl Checker {
    pub fn new(policy: ChunkedCountPolicy, clock: Arc<dyn Clock>) -> Self {
        Self::with_evaluators(vec![
            Box::new(CountEvaluator::new(policy)),
            Box::new(NullEvaluator),
            Box::new(DuplicateEvaluator),
            Box::new(RangeEvaluator::new(clock)),
            Box::new(TransformEvaluator),
            Box::new(MaskingEvaluator),
        ])
    }

    pub fn with_evaluators(evaluators: Vec<Box<dyn Evaluator>>) -> Self {
        Self { evaluators }
    }

    fn evaluator_for(&self, family: RuleFamily) -> Option<&dyn Evaluator> {
        self.evaluators
            .iter()
            .find(|e| e.family() == family)
            .map(|e| e.as_ref())
    }

    #[instrument(skip_all, fields(rule_id = %rule.rule_id))]
    pub async fn evaluate_rule(
        &self,
        rule: &RuleDefinition,
        executor: &dyn QueryExecutor,
    ) -> Vec<CheckResult> {
        let family = match rule.family() {
            Ok(family) => family,
            Err(e) => {
                error!(error = %e, "Rule has no usable family");
                let tag = rule.family.as_deref().unwrap_or("unknown");
                return vec![CheckResult::error(rule, tag, &e)];
            }
        };

        let Some(evaluator) = self.evaluator_for(family) else {
            let e = DomainError::UnknownFamily(family.to_string());
            error!(error = %e, "No evaluator registered");
            return vec![CheckResult::error(rule, family.as_str(), &e)];
        };

        match evaluator.evaluate(rule, executor).await {
            Ok(results) => results,
            Err(e) => {
                let check_type = evaluator.check_type(rule);
                error!(check_type = %check_type, error = %e, "Check failed to run");
                vec![CheckResult::error(rule, check_type.as_str(), &e)]
            }
        }
    }

    /// Evaluates `rules` one after the other; results keep the input order.
    pub async fn run(
        &self,
        rules: &[RuleDefinition],
        executor: &dyn QueryExecutor,
    ) -> Vec<CheckResult> {
        info!(rules = rules.len(), engine = executor.engine_name(), "Running checks");

        let mut results = Vec::with_capacity(rules.len());
        for rule in rules {
            results.extend(self.evaluate_rule(rule, executor).await);
        }
        results
    }
}
