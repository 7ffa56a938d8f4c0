// datacheck-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataCheckError {
    // --- DOMAIN ERRORS (rule configuration) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (database, IO, parsing) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- GENERIC ---
    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl DataCheckError {
    /// True when the executor could not be reached at all. Callers treat this
    /// as fatal for the whole run.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            DataCheckError::Infrastructure(InfrastructureError::Connection { .. })
        )
    }
}

impl From<std::io::Error> for DataCheckError {
    fn from(err: std::io::Error) -> Self {
        DataCheckError::Infrastructure(InfrastructureError::Io(err))
    }
}
