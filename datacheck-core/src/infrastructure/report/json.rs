// datacheck-core/src/infrastructure/report/json.rs

use crate::domain::result::RunReport;
use crate::infrastructure::error::InfrastructureError;

pub fn render(report: &RunReport) -> Result<String, InfrastructureError> {
    Ok(serde_json::to_string_pretty(report)?)
}
