// datacheck-core/src/infrastructure/config/project.rs

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::counting::ChunkedCountPolicy;
use crate::infrastructure::config::connection::ConnectionSettings;
use crate::infrastructure::error::InfrastructureError;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Validate)]
pub struct ProjectConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(rename = "rules-path", default = "default_rules_path")]
    pub rules_path: String,

    #[serde(rename = "report-path", default = "default_report_path")]
    pub report_path: String,

    #[validate(nested)]
    #[serde(default)]
    pub counting: ChunkedCountPolicy,

    /// Environment name -> connection profile.
    #[serde(default)]
    pub environments: BTreeMap<String, ConnectionSettings>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            rules_path: default_rules_path(),
            report_path: default_report_path(),
            counting: ChunkedCountPolicy::default(),
            environments: BTreeMap::new(),
        }
    }
}

fn default_name() -> String {
    "datacheck".to_string()
}
fn default_rules_path() -> String {
    "config/rules".to_string()
}
fn default_report_path() -> String {
    "reports".to_string()
}

#[instrument(skip(project_dir))]
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project config");

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read project config at {:?}", config_path))?;
    let mut config: ProjectConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse project config YAML at {:?}", config_path))?;

    config
        .validate()
        .map_err(|e| InfrastructureError::ConfigError(e.to_string()))?;

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    let candidates = ["datacheck.yaml", "datacheck_project.yaml"];
    for filename in candidates {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, candidates
    )))
}

// DATACHECK_REPORT_PATH=/tmp/out datacheck run
fn apply_env_overrides<F>(config: &mut ProjectConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("DATACHECK_REPORT_PATH") {
        info!(old = ?config.report_path, new = ?val, "Overriding report path via ENV");
        config.report_path = val;
    }
    if let Some(val) = lookup("DATACHECK_RULES_PATH") {
        info!(old = ?config.rules_path, new = ?val, "Overriding rules path via ENV");
        config.rules_path = val;
    }
}

impl ProjectConfig {
    pub fn rules_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.rules_path)
    }

    pub fn report_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.report_path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_load_full_project_file() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("datacheck.yaml"),
            r#"
name: card_dq
rules-path: rules
counting:
  chunk_threshold: 1000
  chunk_size: 250
environments:
  development:
    path: data/dev.duckdb
    connect_retries: 2
"#,
        )?;

        let config = load_project_config(dir.path())?;

        assert_eq!(config.name, "card_dq");
        assert_eq!(config.rules_path, "rules");
        assert_eq!(config.counting.chunk_size, 250);
        assert_eq!(config.environments["development"].connect_retries, 2);
        Ok(())
    }

    #[test]
    fn test_alternate_file_name_and_defaults() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("datacheck_project.yaml"), "name: minimal\n")?;

        let config = load_project_config(dir.path())?;

        assert_eq!(config.counting, ChunkedCountPolicy::default());
        assert!(config.environments.is_empty());
        assert_eq!(config.rules_dir(dir.path()), dir.path().join("config/rules"));
        Ok(())
    }

    #[test]
    fn test_missing_project_file() {
        let dir = tempdir().unwrap();
        let err = load_project_config(dir.path()).unwrap_err();
        assert!(matches!(err, InfrastructureError::ConfigNotFound(_)));
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("datacheck.yaml"),
            "counting:\n  chunk_size: 0\n",
        )?;

        let err = load_project_config(dir.path()).unwrap_err();
        assert!(matches!(err, InfrastructureError::ConfigError(_)));
        Ok(())
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ProjectConfig::default();
        apply_env_overrides(&mut config, |name| match name {
            "DATACHECK_REPORT_PATH" => Some("/tmp/dq".to_string()),
            _ => None,
        });
        assert_eq!(config.report_path, "/tmp/dq");
        assert_eq!(config.rules_path, "config/rules");
    }
}
