// datacheck-core/src/domain/result/details.rs

use serde::Serialize;

use crate::domain::counting::CountStrategy;
use crate::ports::executor::{Row, Value};

/// Evidence attached to a result. Serialized untagged so every variant is a
/// plain nested map in the interchange record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CheckDetails {
    Count(CountDetails),
    Null(NullDetails),
    Duplicate(DuplicateDetails),
    NumericRange(NumericRangeDetails),
    DateRange(DateRangeDetails),
    NoFuture(NoFutureDetails),
    ForeignKey(ForeignKeyDetails),
    Aggregate(AggregateDetails),
    JoinCompare(JoinCompareDetails),
    Existence(ExistenceDetails),
    Masking(MaskingDetails),
    Message { message: String },
    Error { error: String },
}

impl CheckDetails {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountDetails {
    pub source_table: Option<String>,
    pub target_table: Option<String>,
    pub source_count: u64,
    pub target_count: u64,
    pub diff_ratio: f64,
    pub threshold: f64,
    pub where_clause: Option<String>,
    pub source_strategy: CountStrategy,
    pub target_strategy: CountStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NullDetails {
    pub max_null_ratio: f64,
    pub actual_null_ratio: f64,
    pub include_empty_string: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pure_null_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_string_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateDetails {
    pub columns: Vec<String>,
    pub key_kind: Option<String>,
    pub duplicate_groups: u64,
    pub duplicate_rows: u64,
    pub samples: Vec<DuplicateSample>,
}

/// One duplicated key tuple and how often it occurs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateSample {
    pub key: Row,
    pub duplicate_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericRangeDetails {
    pub expected_min: Option<f64>,
    pub expected_max: Option<f64>,
    pub actual_min: Option<String>,
    pub actual_max: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRangeDetails {
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    pub actual_min: Option<String>,
    pub actual_max: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoFutureDetails {
    pub check: &'static str,
    pub reference_time: String,
    pub actual_max: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignKeyDetails {
    pub parent_table: String,
    pub parent_column: String,
    pub orphan_count: u64,
    pub orphan_samples: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateDetails {
    pub compare_column: String,
    pub source_value: f64,
    pub target_value: f64,
    pub difference: f64,
    pub diff_ratio: f64,
    pub tolerance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinCompareDetails {
    pub join_key: String,
    pub compare_column: String,
    pub tolerance: f64,
    pub missing_in_target: u64,
    pub missing_in_source: u64,
    pub value_mismatches: u64,
    pub value_mismatches_sample: Vec<ValueMismatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueMismatch {
    pub key: String,
    pub source_value: Value,
    pub target_value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExistenceDetails {
    pub join_key: String,
    pub source_count: u64,
    pub target_count: u64,
    pub missing_in_target: u64,
    pub missing_in_source: u64,
    pub missing_in_target_sample: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaskingDetails {
    pub masking_type: &'static str,
    pub expected_format: String,
    pub expected_length: Option<u32>,
    /// `critical` for unmasked values found in a masked column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<&'static str>,
    pub violation_samples: Vec<Value>,
}
