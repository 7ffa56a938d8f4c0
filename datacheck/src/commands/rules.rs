// datacheck/src/commands/rules.rs
//
// USE CASE: List the enabled rules of a project, per check family.

use std::path::Path;

use anyhow::Context;
use datacheck_core::domain::rule::RuleFamily;
use datacheck_core::infrastructure::config::{load_project_config, load_rules};

pub fn execute(project_dir: &Path) -> anyhow::Result<()> {
    let config = load_project_config(project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;

    let rules_dir = config.rules_dir(project_dir);
    let rule_set = load_rules(&rules_dir, &RuleFamily::ALL)?;

    println!("📋 {} rules in {}", rule_set.len(), rules_dir.display());

    for family in RuleFamily::ALL {
        let rules = rule_set.rules_for(family);
        if rules.is_empty() {
            continue;
        }

        println!("\n{} ({})", family, rules.len());
        for rule in rules {
            let target = match rule.column_name() {
                Some(column) => format!("{}.{}", rule.table_name(), column),
                None => rule.table_name(),
            };
            if rule.description.is_empty() {
                println!("   ➜ {} [{}]", rule.rule_id, target);
            } else {
                println!("   ➜ {} [{}] {}", rule.rule_id, target, rule.description);
            }
        }
    }

    Ok(())
}
