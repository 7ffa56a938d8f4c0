// datacheck/src/commands/mod.rs

pub mod rules;
pub mod run;
