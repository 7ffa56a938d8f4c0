pub mod connection;
pub mod project;
pub mod rules;

pub use connection::{ConnectionSettings, resolve_connection, substitute_env_vars};
pub use project::{ProjectConfig, load_project_config};
pub use rules::{RuleSet, load_rules};
