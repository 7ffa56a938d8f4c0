// datacheck-core/src/infrastructure/config/rules.rs

// Rule files are discovered anywhere below the rules directory. A family's
// file is `<family>_rules.yml` (or `.yaml`) holding a `<family>_rules:` list.

use anyhow::Context;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::domain::rule::{RuleDefinition, RuleFamily};
use crate::infrastructure::error::InfrastructureError;

/// Enabled rules grouped by family.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    by_family: BTreeMap<RuleFamily, Vec<RuleDefinition>>,
}

impl RuleSet {
    pub fn rules_for(&self, family: RuleFamily) -> &[RuleDefinition] {
        self.by_family.get(&family).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rules of the selected families, in canonical family order.
    pub fn select(&self, families: &[RuleFamily]) -> Vec<RuleDefinition> {
        RuleFamily::ALL
            .iter()
            .filter(|f| families.contains(f))
            .flat_map(|f| self.rules_for(*f).iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_family.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&mut self, family: RuleFamily, rule: RuleDefinition) {
        self.by_family
            .entry(family)
            .or_default()
            .push(rule.with_family(family));
    }
}

#[instrument(skip(rules_dir), fields(dir = ?rules_dir))]
pub fn load_rules(
    rules_dir: &Path,
    families: &[RuleFamily],
) -> Result<RuleSet, InfrastructureError> {
    let mut set = RuleSet::default();
    let files = discover_rule_files(rules_dir);

    for family in families {
        let Some(paths) = files.get(family) else {
            warn!(family = %family, "No {} found, skipping", family.file_name());
            continue;
        };

        for path in paths {
            let rules = load_family_file(path, *family)?;
            let total = rules.len();
            for rule in rules {
                if rule.enabled {
                    set.push(*family, rule);
                } else {
                    debug!(rule_id = %rule.rule_id, "Rule disabled, skipped");
                }
            }
            info!(family = %family, path = ?path, total, "Rules loaded");
        }
    }

    Ok(set)
}

fn discover_rule_files(rules_dir: &Path) -> BTreeMap<RuleFamily, Vec<PathBuf>> {
    let mut files: BTreeMap<RuleFamily, Vec<PathBuf>> = BTreeMap::new();
    if !rules_dir.exists() {
        return files;
    }

    let walker = WalkDir::new(rules_dir).follow_links(true).sort_by_file_name();
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if let Some(family) = family_of(path) {
            files.entry(family).or_default().push(path.to_path_buf());
        }
    }
    files
}

/// `null_rules.yml` -> `RuleFamily::Null`
fn family_of(path: &Path) -> Option<RuleFamily> {
    let ext = path.extension()?.to_str()?;
    if ext != "yml" && ext != "yaml" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_suffix("_rules")?.parse().ok()
}

fn load_family_file(
    path: &Path,
    family: RuleFamily,
) -> Result<Vec<RuleDefinition>, InfrastructureError> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read rule file at {:?}", path))?;
    let document: Option<BTreeMap<String, serde_yaml::Value>> = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse rule file at {:?}", path))?;

    let key = family.rules_key();
    match document.unwrap_or_default().remove(&key) {
        Some(serde_yaml::Value::Null) => Ok(Vec::new()),
        Some(list) => Ok(serde_yaml::from_value(list)
            .with_context(|| format!("Invalid `{}` list in {:?}", key, path))?),
        None => {
            warn!(path = ?path, key = %key, "Rule file has no rule list");
            Ok(Vec::new())
        }
    }
}
