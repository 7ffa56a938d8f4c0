// datacheck-core/src/application/mod.rs

pub mod checker;
pub mod engine;
pub mod evaluators;

// --- RE-EXPORTS (FACADE PATTERN) ---
pub use checker::Checker;
pub use engine::run_validation;
pub use evaluators::Evaluator;
