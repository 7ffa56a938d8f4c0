// datacheck-core/src/domain/result/mod.rs

pub mod check_result;
pub mod details;
pub mod status;
pub mod summary;

pub use check_result::{CheckResult, round_to};
pub use details::CheckDetails;
pub use status::{CheckStatus, CheckType};
pub use summary::{RunReport, RunSummary};
