// datacheck-core/src/infrastructure/config/connection.rs

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use validator::Validate;

use crate::infrastructure::config::project::ProjectConfig;
use crate::infrastructure::error::InfrastructureError;

/// One environment entry of the project file.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Validate)]
pub struct ConnectionSettings {
    /// DuckDB file, or `:memory:`. Relative paths are resolved against the project dir.
    #[validate(length(min = 1))]
    pub path: String,

    #[serde(default)]
    pub read_only: bool,

    #[validate(range(min = 1))]
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,

    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
}

fn default_connect_retries() -> u32 {
    10
}
fn default_retry_interval_secs() -> u64 {
    3
}

impl ConnectionSettings {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }
}

/// Picks the connection of `env`, substitutes `${VAR}` references and
/// anchors relative database paths at `project_dir`.
pub fn resolve_connection(
    project_dir: &Path,
    config: &ProjectConfig,
    env: &str,
) -> Result<ConnectionSettings, InfrastructureError> {
    let settings = config.environments.get(env).ok_or_else(|| {
        let available: Vec<&str> = config.environments.keys().map(String::as_str).collect();
        InfrastructureError::ConfigError(format!(
            "Unknown environment '{}'. Available: {:?}",
            env, available
        ))
    })?;

    let mut resolved = settings.clone();
    resolved.path = substitute_env_vars(&settings.path, |name| std::env::var(name).ok())?;

    if resolved.path != ":memory:" && Path::new(&resolved.path).is_relative() {
        resolved.path = project_dir.join(&resolved.path).to_string_lossy().into_owned();
    }

    resolved
        .validate()
        .map_err(|e| InfrastructureError::ConfigError(format!("environment '{}': {}", env, e)))?;

    Ok(resolved)
}

fn re_var() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{\s*([^}]*?)\s*\}")
            .unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

/// Replaces every `${NAME}` with `lookup(NAME)`. An unset variable is an error.
pub fn substitute_env_vars<F>(raw: &str, lookup: F) -> Result<String, InfrastructureError>
where
    F: Fn(&str) -> Option<String>,
{
    let re = re_var();

    if re.replace_all(raw, "").contains("${") {
        return Err(InfrastructureError::ConfigError(format!(
            "Unterminated variable reference in '{}'",
            raw
        )));
    }

    let mut unset: Option<String> = None;
    let out = re.replace_all(raw, |caps: &Captures| {
        let name = &caps[1];
        lookup(name).unwrap_or_else(|| {
            unset.get_or_insert_with(|| name.to_string());
            String::new()
        })
    });

    match unset {
        Some(name) => Err(InfrastructureError::ConfigError(format!(
            "Environment variable '{}' is not set",
            name
        ))),
        None => Ok(out.into_owned()),
    }
}
