// datacheck-core/src/domain/rule/mod.rs

pub mod definition;
pub mod family;
pub mod params;

pub use definition::RuleDefinition;
pub use family::RuleFamily;
