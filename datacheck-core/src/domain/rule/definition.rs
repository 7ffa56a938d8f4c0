// datacheck-core/src/domain/rule/definition.rs

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::error::DomainError;
use crate::domain::rule::family::RuleFamily;
use crate::ports::executor::Value;

/// A configured rule as loaded from YAML.
///
/// Family-specific fields stay in `params` untouched; each evaluator parses
/// its own typed view with [`RuleDefinition::parse_params`]. A malformed rule
/// therefore only fails when it is evaluated, never the whole rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub rule_id: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Family tag. Set by the loader from the rule file the rule came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(flatten)]
    pub params: serde_json::Map<String, Value>,
}

fn default_enabled() -> bool {
    true
}

impl RuleDefinition {
    pub fn family(&self) -> Result<RuleFamily, DomainError> {
        match self.family.as_deref() {
            Some(tag) => tag.parse(),
            None => Err(DomainError::InvalidRule {
                rule_id: self.rule_id.clone(),
                message: "rule has no family tag".to_string(),
            }),
        }
    }

    /// Typed, validated view of the family-specific fields.
    pub fn parse_params<T>(&self) -> Result<T, DomainError>
    where
        T: DeserializeOwned + Validate,
    {
        let params: T = serde_json::from_value(Value::Object(self.params.clone())).map_err(
            |e| DomainError::InvalidRule {
                rule_id: self.rule_id.clone(),
                message: e.to_string(),
            },
        )?;

        params.validate().map_err(|e| DomainError::InvalidRule {
            rule_id: self.rule_id.clone(),
            message: e.to_string(),
        })?;

        Ok(params)
    }

    /// Table the rule is about: `table`, falling back to `source_table`.
    pub fn table_name(&self) -> String {
        self.str_param("table")
            .or_else(|| self.str_param("source_table"))
            .unwrap_or_default()
            .to_string()
    }

    /// `column`, or the comma-joined `columns` list for key rules.
    pub fn column_name(&self) -> Option<String> {
        if let Some(column) = self.str_param("column") {
            return Some(column.to_string());
        }
        let columns = self.params.get("columns")?.as_array()?;
        let names: Vec<&str> = columns.iter().filter_map(Value::as_str).collect();
        if names.is_empty() {
            None
        } else {
            Some(names.join(", "))
        }
    }

    fn str_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    pub fn with_family(mut self, family: RuleFamily) -> Self {
        self.family = Some(family.as_str().to_string());
        self
    }
}
