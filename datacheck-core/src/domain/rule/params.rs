// datacheck-core/src/domain/rule/params.rs

// Typed views over the raw rule parameters, one per family.
// Sub-modes are kept as text here and resolved with `FromStr` so an unknown
// value reports which rule and which setting was wrong.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::domain::error::DomainError;

fn default_primary_key() -> String {
    "id".to_string()
}

// --- COUNT ---

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CountParams {
    pub source_table: Option<String>,
    pub target_table: Option<String>,

    /// Used only when `target_count_query` is given as well.
    pub source_count_query: Option<String>,
    pub target_count_query: Option<String>,

    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub threshold: f64,

    pub where_clause: Option<String>,

    #[validate(length(min = 1))]
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
}

/// Where the two counts of a count rule come from.
pub enum CountSource<'a> {
    Queries { source: &'a str, target: &'a str },
    Tables { source: &'a str, target: &'a str },
}

impl CountParams {
    pub fn source(&self, rule_id: &str) -> Result<CountSource<'_>, DomainError> {
        if let (Some(source), Some(target)) = (&self.source_count_query, &self.target_count_query) {
            return Ok(CountSource::Queries { source, target });
        }
        match (&self.source_table, &self.target_table) {
            (Some(source), Some(target)) => Ok(CountSource::Tables { source, target }),
            _ => Err(DomainError::InvalidRule {
                rule_id: rule_id.to_string(),
                message: "source_table and target_table are required unless both \
                          source_count_query and target_count_query are set"
                    .to_string(),
            }),
        }
    }
}

// --- NULL ---

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NullParams {
    pub table: String,
    pub column: String,

    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default)]
    pub max_null_ratio: f64,

    #[serde(default)]
    pub include_empty_string: bool,
}

// --- DUPLICATE ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    Pk,
    Composite,
    Unique,
}

impl KeyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pk => "pk",
            Self::Composite => "composite",
            Self::Unique => "unique",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DuplicateParams {
    pub table: String,

    #[validate(length(min = 1))]
    pub columns: Vec<String>,

    /// Descriptive only. Older rule files call it `check_type`.
    #[serde(default, alias = "check_type")]
    pub key_kind: Option<KeyKind>,
}

// --- RANGE ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeMode {
    Range,
    Positive,
    DateRange,
    NoFuture,
    ForeignKey,
}

impl FromStr for RangeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "range" => Ok(Self::Range),
            "positive" => Ok(Self::Positive),
            "date_range" => Ok(Self::DateRange),
            "no_future" => Ok(Self::NoFuture),
            "foreign_key" => Ok(Self::ForeignKey),
            _ => Err(format!("Unknown range check type: {}", s)),
        }
    }
}

impl fmt::Display for RangeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Range => "range",
            Self::Positive => "positive",
            Self::DateRange => "date_range",
            Self::NoFuture => "no_future",
            Self::ForeignKey => "foreign_key",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RangeParams {
    pub table: String,
    pub column: String,

    #[serde(default)]
    pub check_type: Option<String>,

    pub min_value: Option<f64>,
    pub max_value: Option<f64>,

    /// `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.
    pub min_date: Option<String>,
    pub max_date: Option<String>,

    pub parent_table: Option<String>,
    pub parent_column: Option<String>,
}

impl RangeParams {
    pub fn mode(&self, rule_id: &str) -> Result<RangeMode, DomainError> {
        match self.check_type.as_deref() {
            None => Ok(RangeMode::Range),
            Some(raw) => raw.parse().map_err(|_| DomainError::UnknownMode {
                rule_id: rule_id.to_string(),
                kind: "check_type",
                value: raw.to_string(),
            }),
        }
    }
}

// --- TRANSFORM ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformMode {
    Aggregate,
    Join,
    Existence,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TransformParams {
    pub source_query: String,
    pub target_query: String,

    /// `value` (default) or `existence`.
    #[serde(default)]
    pub compare_type: Option<String>,

    pub join_key: Option<String>,
    pub compare_column: Option<String>,

    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub tolerance: f64,
}

impl TransformParams {
    pub fn mode(&self, rule_id: &str) -> Result<TransformMode, DomainError> {
        let existence = match self.compare_type.as_deref().map(|s| s.trim().to_lowercase()) {
            None => false,
            Some(kind) if kind == "value" => false,
            Some(kind) if kind == "existence" => true,
            Some(_) => {
                return Err(DomainError::UnknownMode {
                    rule_id: rule_id.to_string(),
                    kind: "compare_type",
                    value: self.compare_type.clone().unwrap_or_default(),
                });
            }
        };

        if existence {
            return Ok(TransformMode::Existence);
        }
        if self.join_key.is_some() {
            Ok(TransformMode::Join)
        } else {
            Ok(TransformMode::Aggregate)
        }
    }

    pub fn require_join_key(&self, rule_id: &str) -> Result<&str, DomainError> {
        require(self.join_key.as_deref(), rule_id, "join_key")
    }

    pub fn require_compare_column(&self, rule_id: &str) -> Result<&str, DomainError> {
        require(self.compare_column.as_deref(), rule_id, "compare_column")
    }
}

// --- MASKING ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskingType {
    Ssn,
    Phone,
    Hash,
    LeakCheck,
}

impl MaskingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ssn => "ssn",
            Self::Phone => "phone",
            Self::Hash => "hash",
            Self::LeakCheck => "leak_check",
        }
    }
}

impl FromStr for MaskingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ssn" => Ok(Self::Ssn),
            "phone" => Ok(Self::Phone),
            "hash" => Ok(Self::Hash),
            "leak_check" => Ok(Self::LeakCheck),
            _ => Err(format!("Unknown masking type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MaskingParams {
    pub table: String,
    pub column: String,
    pub masking_type: String,

    #[validate(range(min = 1))]
    pub expected_length: Option<u32>,

    /// 1-based start of the masked region.
    #[validate(range(min = 1))]
    pub expected_pattern_start: Option<u32>,

    #[validate(length(min = 1))]
    pub expected_pattern_value: Option<String>,
}

impl MaskingParams {
    pub fn masking_type(&self, rule_id: &str) -> Result<MaskingType, DomainError> {
        self.masking_type
            .parse()
            .map_err(|_| DomainError::UnknownMode {
                rule_id: rule_id.to_string(),
                kind: "masking_type",
                value: self.masking_type.clone(),
            })
    }
}

fn require<'a>(value: Option<&'a str>, rule_id: &str, field: &str) -> Result<&'a str, DomainError> {
    value.ok_or_else(|| DomainError::InvalidRule {
        rule_id: rule_id.to_string(),
        message: format!("missing field `{}`", field),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::rule::RuleDefinition;

    fn rule(yaml: &str) -> RuleDefinition {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_count_prefers_custom_queries_only_when_both_present() {
        let r = rule(
            "rule_id: C\nsource_table: a\ntarget_table: b\nsource_count_query: SELECT 1",
        );
        let params: CountParams = r.parse_params().unwrap();
        assert!(matches!(
            params.source("C").unwrap(),
            CountSource::Tables { source: "a", target: "b" }
        ));
        assert_eq!(params.primary_key, "id");
        assert_eq!(params.threshold, 0.0);
    }

    #[test]
    fn test_count_without_tables_or_queries_is_rejected() {
        let params: CountParams = rule("rule_id: C\nsource_table: a").parse_params().unwrap();
        assert!(matches!(params.source("C"), Err(DomainError::InvalidRule { .. })));
    }

    #[test]
    fn test_negative_threshold_is_rejected() {
        let r = rule("rule_id: C\nsource_table: a\ntarget_table: b\nthreshold: -0.1");
        assert!(r.parse_params::<CountParams>().is_err());
    }

    #[test]
    fn test_duplicate_accepts_legacy_check_type_key() {
        let r = rule("rule_id: D\ntable: t\ncolumns: [id]\ncheck_type: pk");
        let params: DuplicateParams = r.parse_params().unwrap();
        assert_eq!(params.key_kind, Some(KeyKind::Pk));
    }

    #[test]
    fn test_duplicate_requires_at_least_one_column() {
        let r = rule("rule_id: D\ntable: t\ncolumns: []");
        assert!(r.parse_params::<DuplicateParams>().is_err());
    }

    #[test]
    fn test_range_mode_defaults_and_unknown() {
        let params: RangeParams = rule("rule_id: R\ntable: t\ncolumn: c").parse_params().unwrap();
        assert_eq!(params.mode("R").unwrap(), RangeMode::Range);

        let params: RangeParams = rule("rule_id: R\ntable: t\ncolumn: c\ncheck_type: weekday")
            .parse_params()
            .unwrap();
        assert!(matches!(
            params.mode("R"),
            Err(DomainError::UnknownMode { kind: "check_type", .. })
        ));
    }

    #[test]
    fn test_transform_mode_resolution() {
        let base = "rule_id: T\nsource_query: s\ntarget_query: t\n";

        let p: TransformParams = rule(base).parse_params().unwrap();
        assert_eq!(p.mode("T").unwrap(), TransformMode::Aggregate);

        let p: TransformParams = rule(&format!("{base}join_key: k")).parse_params().unwrap();
        assert_eq!(p.mode("T").unwrap(), TransformMode::Join);

        let p: TransformParams = rule(&format!("{base}join_key: k\ncompare_type: existence"))
            .parse_params()
            .unwrap();
        assert_eq!(p.mode("T").unwrap(), TransformMode::Existence);

        let p: TransformParams = rule(&format!("{base}compare_type: fuzzy")).parse_params().unwrap();
        assert!(p.mode("T").is_err());
    }

    #[test]
    fn test_unknown_masking_type() {
        let p: MaskingParams = rule("rule_id: M\ntable: t\ncolumn: c\nmasking_type: email")
            .parse_params()
            .unwrap();
        let err = p.masking_type("M").unwrap_err();
        assert_eq!(err.to_string(), "Unknown masking_type 'email' in rule 'M'");
    }
}
