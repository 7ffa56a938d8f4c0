// datacheck-core/src/ports/executor.rs

// What the engine needs from a storage backend, without knowing which one.
// Retry, pooling and timeouts live behind this trait, never in the evaluators.

use async_trait::async_trait;

use crate::domain::counting;
use crate::domain::sql;
use crate::error::DataCheckError;

/// A single cell. The JSON value model keeps evidence serializable as-is.
pub use serde_json::Value;

/// One result row: column name -> value.
pub type Row = serde_json::Map<String, Value>;

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Runs a query and returns every row.
    async fn execute_query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DataCheckError>;

    /// First column of the first row, `None` when the query returns no row.
    async fn execute_scalar(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<Value>, DataCheckError>;

    async fn execute_count(
        &self,
        table: &str,
        where_clause: Option<&str>,
    ) -> Result<u64, DataCheckError> {
        let query = sql::count_rows(table, where_clause);
        let value = self.execute_scalar(&query, &[]).await?;
        Ok(value.as_ref().and_then(value_as_u64).unwrap_or(0))
    }

    /// Counts rows by summing contiguous key ranges of `chunk_size`.
    async fn execute_chunked_count(
        &self,
        table: &str,
        key_column: &str,
        chunk_size: u64,
    ) -> Result<u64, DataCheckError> {
        counting::count_by_key_ranges(self, table, key_column, chunk_size).await
    }

    /// Catalog row estimate. Only used to pick a counting strategy.
    async fn approximate_count(&self, _table: &str) -> Result<Option<u64>, DataCheckError> {
        Ok(None)
    }

    fn engine_name(&self) -> &str;
}

// --- VALUE HELPERS ---

pub fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_i64().map(|v| v.max(0) as u64))
            .or_else(|| n.as_f64().map(|v| v.max(0.0).round() as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|v| v.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Numeric view of a cell. Numeric strings count, booleans and text do not.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Stable textual form used for join keys and report evidence.
pub fn value_to_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_as_u64_accepts_counts_in_any_numeric_shape() {
        assert_eq!(value_as_u64(&json!(42)), Some(42));
        assert_eq!(value_as_u64(&json!(42.0)), Some(42));
        assert_eq!(value_as_u64(&json!("42")), Some(42));
        assert_eq!(value_as_u64(&json!(-3)), Some(0));
        assert_eq!(value_as_u64(&Value::Null), None);
    }

    #[test]
    fn test_value_as_f64_rejects_text() {
        assert_eq!(value_as_f64(&json!(1.5)), Some(1.5));
        assert_eq!(value_as_f64(&json!("2.25")), Some(2.25));
        assert_eq!(value_as_f64(&json!("abc")), None);
        assert_eq!(value_as_f64(&json!(true)), None);
    }

    #[test]
    fn test_value_to_key_is_stable_across_types() {
        assert_eq!(value_to_key(&json!(7)), "7");
        assert_eq!(value_to_key(&json!("7")), "7");
        assert_eq!(value_to_key(&json!(7.5)), "7.5");
    }
}
