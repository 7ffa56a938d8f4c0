// datacheck-core/src/domain/rule/family.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;
use crate::domain::result::CheckType;

/// Check family a rule belongs to. Also decides which rule file holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleFamily {
    Count,
    Null,
    Duplicate,
    Range,
    Transform,
    Masking,
}

impl RuleFamily {
    /// Canonical execution order.
    pub const ALL: [RuleFamily; 6] = [
        Self::Count,
        Self::Null,
        Self::Duplicate,
        Self::Range,
        Self::Transform,
        Self::Masking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Null => "null",
            Self::Duplicate => "duplicate",
            Self::Range => "range",
            Self::Transform => "transform",
            Self::Masking => "masking",
        }
    }

    /// Top-level key of the family's rule file, e.g. `null_rules`.
    pub fn rules_key(&self) -> String {
        format!("{}_rules", self.as_str())
    }

    pub fn file_name(&self) -> String {
        format!("{}.yml", self.rules_key())
    }

    /// Parses a comma separated selection such as `count,null`.
    /// An empty selection means every family.
    pub fn parse_list(raw: &str) -> Result<Vec<RuleFamily>, DomainError> {
        let mut families = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let family: RuleFamily = part.parse()?;
            if !families.contains(&family) {
                families.push(family);
            }
        }
        if families.is_empty() {
            return Ok(Self::ALL.to_vec());
        }
        Ok(families)
    }

    /// Result type reported when the rule's own sub-mode is not known yet.
    pub fn default_check_type(&self) -> CheckType {
        match self {
            Self::Count => CheckType::Count,
            Self::Null => CheckType::Null,
            Self::Duplicate => CheckType::Duplicate,
            Self::Range => CheckType::Range,
            Self::Transform => CheckType::Transform,
            Self::Masking => CheckType::Masking,
        }
    }
}

impl FromStr for RuleFamily {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "count" => Ok(Self::Count),
            "null" => Ok(Self::Null),
            "duplicate" => Ok(Self::Duplicate),
            "range" => Ok(Self::Range),
            "transform" => Ok(Self::Transform),
            "masking" => Ok(Self::Masking),
            _ => Err(DomainError::UnknownFamily(s.to_string())),
        }
    }
}

impl fmt::Display for RuleFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_family_parsing_is_case_insensitive() {
        assert_eq!("NULL".parse::<RuleFamily>().ok(), Some(RuleFamily::Null));
        assert_eq!(" masking ".parse::<RuleFamily>().ok(), Some(RuleFamily::Masking));
    }

    #[test]
    fn test_unknown_family_is_a_domain_error() {
        let err = "freshness".parse::<RuleFamily>().unwrap_err();
        assert!(matches!(err, DomainError::UnknownFamily(ref f) if f == "freshness"));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            RuleFamily::parse_list("null, count,null").unwrap(),
            vec![RuleFamily::Null, RuleFamily::Count]
        );
        assert_eq!(RuleFamily::parse_list(" ").unwrap().len(), 6);
        assert!(RuleFamily::parse_list("count,bogus").is_err());
    }

    #[test]
    fn test_rule_file_names() {
        assert_eq!(RuleFamily::Count.file_name(), "count_rules.yml");
        assert_eq!(RuleFamily::Transform.rules_key(), "transform_rules");
    }
}
