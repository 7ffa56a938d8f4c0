// datacheck-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Invalid rule '{rule_id}': {message}")]
    #[diagnostic(
        code(datacheck::domain::invalid_rule),
        help("Check the required fields for this rule family.")
    )]
    InvalidRule { rule_id: String, message: String },

    #[error("Unknown check family '{0}'")]
    #[diagnostic(
        code(datacheck::domain::unknown_family),
        help("Expected one of: count, null, duplicate, range, transform, masking.")
    )]
    UnknownFamily(String),

    #[error("Unknown {kind} '{value}' in rule '{rule_id}'")]
    #[diagnostic(code(datacheck::domain::unknown_mode))]
    UnknownMode {
        rule_id: String,
        kind: &'static str,
        value: String,
    },

    #[error("Unexpected value for '{field}' in rule '{rule_id}': {message}")]
    #[diagnostic(code(datacheck::domain::value))]
    UnexpectedValue {
        rule_id: String,
        field: String,
        message: String,
    },
}
