// datacheck-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DuckDB Engine Error: {0}")]
    #[diagnostic(
        code(datacheck::infra::database::duckdb),
        help("An error occurred inside the SQL engine.")
    )]
    DuckDB(#[from] duckdb::Error),

    #[error("Connection lock poisoned")]
    #[diagnostic(code(datacheck::infra::database::poisoned))]
    Poisoned,
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- DATABASE ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    #[error("Could not connect to '{target}' after {attempts} attempt(s): {message}")]
    #[diagnostic(
        code(datacheck::infra::connection),
        help("Check the connection profile of the selected environment.")
    )]
    Connection {
        target: String,
        attempts: u32,
        message: String,
    },

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(datacheck::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(datacheck::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(code(datacheck::infra::config_missing))]
    ConfigNotFound(String),

    // --- REPORTS ---
    #[error("JSON Serialization Error: {0}")]
    #[diagnostic(code(datacheck::infra::json))]
    Json(#[from] serde_json::Error),

    #[error("CSV Error: {0}")]
    #[diagnostic(code(datacheck::infra::csv))]
    Csv(#[from] csv::Error),

    #[error("Template Rendering Error: {0}")]
    #[diagnostic(code(datacheck::infra::template))]
    TemplateError(#[from] minijinja::Error),
}

// Shortcut for `?` on duckdb calls
impl From<duckdb::Error> for InfrastructureError {
    fn from(err: duckdb::Error) -> Self {
        InfrastructureError::Database(DatabaseError::DuckDB(err))
    }
}

impl From<anyhow::Error> for InfrastructureError {
    fn from(err: anyhow::Error) -> Self {
        InfrastructureError::ConfigError(format!("{:#}", err))
    }
}
