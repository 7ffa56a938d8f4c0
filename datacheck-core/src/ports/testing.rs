// datacheck-core/src/ports/testing.rs

// Scripted executor: answers from closures and records every call.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::DataCheckError;
use crate::ports::executor::{QueryExecutor, Row, Value};

type ScalarFn = Box<dyn Fn(&str, &[Value]) -> Option<Value> + Send + Sync>;
type RowsFn = Box<dyn Fn(&str) -> Result<Vec<Row>, String> + Send + Sync>;

pub(crate) struct ScriptedExecutor {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    scalar: ScalarFn,
    rows: RowsFn,
    approximate: Option<u64>,
}

#[allow(clippy::unwrap_used)]
impl ScriptedExecutor {
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            scalar: Box::new(|_, _| None),
            rows: Box::new(|_| Ok(Vec::new())),
            approximate: None,
        }
    }

    pub(crate) fn with_scalar(
        mut self,
        f: impl Fn(&str, &[Value]) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        self.scalar = Box::new(f);
        self
    }

    pub(crate) fn with_rows(
        mut self,
        f: impl Fn(&str) -> Result<Vec<Row>, String> + Send + Sync + 'static,
    ) -> Self {
        self.rows = Box::new(f);
        self
    }

    pub(crate) fn with_approximate_count(mut self, approximate: Option<u64>) -> Self {
        self.approximate = approximate;
        self
    }

    pub(crate) fn calls_containing(&self, needle: &str) -> Vec<(String, Vec<Value>)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(sql, _)| sql.contains(needle))
            .cloned()
            .collect()
    }

    fn record(&self, sql: &str, params: &[Value]) {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
    }
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn execute_query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DataCheckError> {
        self.record(sql, params);
        (self.rows)(sql).map_err(DataCheckError::InternalError)
    }

    async fn execute_scalar(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<Value>, DataCheckError> {
        self.record(sql, params);
        Ok((self.scalar)(sql, params))
    }

    async fn approximate_count(&self, _table: &str) -> Result<Option<u64>, DataCheckError> {
        Ok(self.approximate)
    }

    fn engine_name(&self) -> &str {
        "scripted"
    }
}

/// Builds a row from `(column, value)` pairs.
pub(crate) fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
