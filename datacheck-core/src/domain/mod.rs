pub mod counting;
pub mod error;
pub mod result;
pub mod rule;
pub mod sql;

// Re-exports to keep imports short elsewhere
pub use error::DomainError;
pub use result::{CheckDetails, CheckResult, CheckStatus, CheckType, RunReport, RunSummary};
pub use rule::{RuleDefinition, RuleFamily};
