// datacheck-core/src/application/engine.rs

use chrono::Local;
use std::time::Instant;
use tracing::{info, instrument};

use crate::application::checker::Checker;
use crate::domain::result::RunReport;
use crate::domain::rule::{RuleDefinition, RuleFamily};
use crate::ports::executor::QueryExecutor;

/// Runs the rules of the selected `families` in canonical family order
/// (count, null, duplicate, range, transform, masking) and summarizes them.
/// Within a family the configured order is kept.
#[instrument(skip_all, fields(families = ?families))]
pub async fn run_validation(
    checker: &Checker,
    rules: &[RuleDefinition],
    families: &[RuleFamily],
    executor: &dyn QueryExecutor,
) -> RunReport {
    let started_at = Local::now();
    let timer = Instant::now();

    let selected = select_rules(rules, families);
    info!(
        selected = selected.len(),
        configured = rules.len(),
        "🚀 Starting validation run"
    );

    let results = checker.run(&selected, executor).await;
    let report = RunReport::new(results, started_at, timer.elapsed().as_secs_f64());

    let s = &report.summary;
    info!(
        total = s.total_checks,
        passed = s.passed,
        failed = s.failed,
        warnings = s.warnings,
        errors = s.errors,
        pass_rate = s.pass_rate,
        elapsed_secs = report.elapsed_secs,
        "🏁 Validation run finished"
    );
    report
}

/// Rules whose family is selected, grouped in canonical family order.
/// Rules without a resolvable family are kept (at the end) so they surface
/// as ERROR results instead of disappearing.
fn select_rules(rules: &[RuleDefinition], families: &[RuleFamily]) -> Vec<RuleDefinition> {
    let rank = |rule: &RuleDefinition| match rule.family() {
        Ok(family) => RuleFamily::ALL.iter().position(|f| *f == family),
        Err(_) => None,
    };

    let mut selected: Vec<(usize, RuleDefinition)> = rules
        .iter()
        .filter_map(|rule| match rule.family() {
            Ok(family) if !families.contains(&family) => None,
            _ => Some((rank(rule).unwrap_or(RuleFamily::ALL.len()), rule.clone())),
        })
        .collect();

    // stable: configured order survives within a family
    selected.sort_by_key(|(rank, _)| *rank);
    selected.into_iter().map(|(_, rule)| rule).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::evaluators::fixture::{card_db, june_second, rule};
    use crate::domain::counting::ChunkedCountPolicy;
    use crate::domain::result::CheckStatus;
    use anyhow::Result;
    use std::sync::Arc;

    fn rules() -> Vec<RuleDefinition> {
        vec![
            rule(
                RuleFamily::Masking,
                "rule_id: MSK-001\ntable: customers\ncolumn: phone\nmasking_type: phone",
            ),
            rule(RuleFamily::Null, "rule_id: NUL-001\ntable: customers\ncolumn: name"),
            rule(
                RuleFamily::Count,
                "rule_id: CNT-001\nsource_table: transactions\ntarget_table: tgt_transactions",
            ),
            rule(RuleFamily::Null, "rule_id: NUL-002\ntable: customers\ncolumn: phone\nmax_null_ratio: 0.5"),
        ]
    }

    #[test]
    fn test_selection_orders_by_family_and_keeps_config_order() {
        let ids: Vec<String> = select_rules(&rules(), &RuleFamily::ALL)
            .into_iter()
            .map(|r| r.rule_id)
            .collect();
        assert_eq!(ids, vec!["CNT-001", "NUL-001", "NUL-002", "MSK-001"]);

        let only_null = select_rules(&rules(), &[RuleFamily::Null]);
        assert_eq!(only_null.len(), 2);
    }

    #[tokio::test]
    async fn test_run_validation_reports_summary() -> Result<()> {
        let db = card_db()?;
        let checker = Checker::new(ChunkedCountPolicy::default(), Arc::new(june_second()));

        let report = run_validation(&checker, &rules(), &[RuleFamily::Null, RuleFamily::Masking], &db).await;

        assert_eq!(report.summary.total_checks, 3);
        assert_eq!(report.results[0].rule_id(), "NUL-001");
        assert_eq!(report.results[2].status(), CheckStatus::Fail);
        assert_eq!(report.summary.passed, 2);
        assert!(!report.summary.is_success());
        assert!(report.elapsed_secs >= 0.0);
        Ok(())
    }
}
