// datacheck-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate};
use duckdb::types::{TimeUnit, Value as DuckValue};
use duckdb::{AccessMode, Config, Connection, params_from_iter};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

// Imports Hexagonaux
use crate::error::DataCheckError;
use crate::infrastructure::config::ConnectionSettings;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::executor::{QueryExecutor, Row, Value};

pub struct DuckDbExecutor {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDbExecutor {
    pub fn open(db_path: &str, read_only: bool) -> Result<Self, InfrastructureError> {
        let mut config = Config::default();
        if read_only {
            config = config.access_mode(AccessMode::ReadOnly)?;
        }

        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self, InfrastructureError> {
        Self::open(":memory:", false)
    }

    /// Opens the database of a connection profile, retrying on failure.
    /// Gives up with `InfrastructureError::Connection` after the last attempt.
    #[instrument(skip(settings), fields(path = %settings.path))]
    pub async fn connect(settings: &ConnectionSettings) -> Result<Self, InfrastructureError> {
        let attempts = settings.connect_retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match Self::open(&settings.path, settings.read_only) {
                Ok(executor) => {
                    info!(attempt, "Connected to DuckDB");
                    return Ok(executor);
                }
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "DuckDB connection failed");
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(settings.retry_interval()).await;
                    }
                }
            }
        }

        Err(InfrastructureError::Connection {
            target: settings.path.clone(),
            attempts,
            message: last_error,
        })
    }

    /// Runs a batch of statements (fixtures, setup scripts).
    pub fn execute_batch(&self, sql: &str) -> Result<(), InfrastructureError> {
        self.lock()?.execute_batch(sql)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, InfrastructureError> {
        self.conn
            .lock()
            .map_err(|_| InfrastructureError::Database(DatabaseError::Poisoned))
    }

    fn query_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, InfrastructureError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(params.iter().map(to_duck_value)))?;

        let columns: Vec<String> = rows
            .as_ref()
            .map(|s| s.column_names())
            .unwrap_or_default();

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (idx, name) in columns.iter().enumerate() {
                let cell: DuckValue = row.get(idx)?;
                record.insert(name.clone(), from_duck_value(cell));
            }
            out.push(record);
        }
        Ok(out)
    }

    fn query_first_cell(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<Value>, InfrastructureError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(params.iter().map(to_duck_value)))?;

        match rows.next()? {
            Some(row) => {
                let cell: DuckValue = row.get(0)?;
                Ok(Some(from_duck_value(cell)))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl QueryExecutor for DuckDbExecutor {
    async fn execute_query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DataCheckError> {
        debug!(sql, "execute_query");
        Ok(self.query_rows(sql, params)?)
    }

    async fn execute_scalar(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<Value>, DataCheckError> {
        debug!(sql, "execute_scalar");
        Ok(self.query_first_cell(sql, params)?)
    }

    async fn approximate_count(&self, table: &str) -> Result<Option<u64>, DataCheckError> {
        let estimate = self.query_first_cell(
            "SELECT estimated_size FROM duckdb_tables() WHERE table_name = ?",
            &[Value::String(table.to_string())],
        )?;
        Ok(estimate
            .as_ref()
            .and_then(crate::ports::executor::value_as_u64))
    }

    fn engine_name(&self) -> &str {
        "duckdb"
    }
}

// --- VALUE CONVERSION ---

fn to_duck_value(value: &Value) -> DuckValue {
    match value {
        Value::Null => DuckValue::Null,
        Value::Bool(b) => DuckValue::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                DuckValue::BigInt(i)
            } else if let Some(u) = n.as_u64() {
                DuckValue::UBigInt(u)
            } else {
                DuckValue::Double(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => DuckValue::Text(s.clone()),
        other => DuckValue::Text(other.to_string()),
    }
}

fn from_duck_value(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(b),
        DuckValue::TinyInt(i) => Value::from(i),
        DuckValue::SmallInt(i) => Value::from(i),
        DuckValue::Int(i) => Value::from(i),
        DuckValue::BigInt(i) => Value::from(i),
        DuckValue::UTinyInt(i) => Value::from(i),
        DuckValue::USmallInt(i) => Value::from(i),
        DuckValue::UInt(i) => Value::from(i),
        DuckValue::UBigInt(i) => Value::from(i),
        DuckValue::HugeInt(i) => match i64::try_from(i) {
            Ok(small) => Value::from(small),
            Err(_) => Value::String(i.to_string()),
        },
        DuckValue::Float(f) => float(f64::from(f)),
        DuckValue::Double(f) => float(f),
        DuckValue::Decimal(d) => match d.to_string().parse::<f64>() {
            Ok(f) => float(f),
            Err(_) => Value::String(d.to_string()),
        },
        DuckValue::Text(s) | DuckValue::Enum(s) => Value::String(s),
        DuckValue::Date32(days) => {
            let date = NaiveDate::from_ymd_opt(1970, 1, 1)
                .and_then(|epoch| epoch.checked_add_signed(Duration::days(i64::from(days))));
            match date {
                Some(d) => Value::String(d.format("%Y-%m-%d").to_string()),
                None => Value::from(days),
            }
        }
        DuckValue::Timestamp(unit, raw) => {
            match DateTime::from_timestamp_micros(to_micros(unit, raw)) {
                Some(ts) => Value::String(ts.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string()),
                None => Value::from(raw),
            }
        }
        DuckValue::List(items) | DuckValue::Array(items) => {
            Value::Array(items.into_iter().map(from_duck_value).collect())
        }
        other => Value::String(format!("{:?}", other)),
    }
}

/// JSON cannot hold NaN or infinities.
fn float(f: f64) -> Value {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn to_micros(unit: TimeUnit, raw: i64) -> i64 {
    match unit {
        TimeUnit::Second => raw.saturating_mul(1_000_000),
        TimeUnit::Millisecond => raw.saturating_mul(1_000),
        TimeUnit::Microsecond => raw,
        TimeUnit::Nanosecond => raw / 1_000,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    fn seeded() -> Result<DuckDbExecutor> {
        let executor = DuckDbExecutor::open_in_memory()?;
        executor.execute_batch(
            "CREATE TABLE payments (
                id INTEGER,
                amount DECIMAL(12,2),
                rate DOUBLE,
                paid_on DATE,
                paid_at TIMESTAMP,
                memo VARCHAR,
                settled BOOLEAN
            );
            INSERT INTO payments VALUES
                (1, 1500.50, 0.25, DATE '2024-03-01', TIMESTAMP '2024-03-01 10:30:00', 'ok', true),
                (2, NULL, NULL, NULL, NULL, NULL, NULL);",
        )?;
        Ok(executor)
    }

    #[tokio::test]
    async fn test_rows_are_converted_to_json_values() -> Result<()> {
        let executor = seeded()?;

        let rows = executor
            .execute_query("SELECT * FROM payments ORDER BY id", &[])
            .await?;

        assert_eq!(rows.len(), 2);
        let first = &rows[0];
        assert_eq!(first["id"], json!(1));
        assert_eq!(first["amount"], json!(1500.5));
        assert_eq!(first["rate"], json!(0.25));
        assert_eq!(first["paid_on"], json!("2024-03-01"));
        assert_eq!(first["paid_at"], json!("2024-03-01 10:30:00"));
        assert_eq!(first["memo"], json!("ok"));
        assert_eq!(first["settled"], json!(true));
        assert!(rows[1].values().all(|v| v.is_null() || v == &json!(2)));
        Ok(())
    }

    #[tokio::test]
    async fn test_scalar_binds_parameters() -> Result<()> {
        let executor = seeded()?;

        let count = executor
            .execute_scalar("SELECT COUNT(*) FROM payments WHERE id >= ?", &[json!(2)])
            .await?;
        assert_eq!(count, Some(json!(1)));

        let none = executor
            .execute_scalar("SELECT id FROM payments WHERE memo = ?", &[json!("missing")])
            .await?;
        assert_eq!(none, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_default_count_and_catalog_estimate() -> Result<()> {
        let executor = seeded()?;

        assert_eq!(executor.execute_count("payments", None).await?, 2);
        assert_eq!(
            executor.execute_count("payments", Some("settled")).await?,
            1
        );
        assert_eq!(executor.approximate_count("no_such_table").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_query_errors_surface_as_infrastructure_errors() -> Result<()> {
        let executor = seeded()?;

        let err = executor
            .execute_query("SELECT * FROM missing_table", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DataCheckError::Infrastructure(_)));
        assert!(err.to_string().contains("missing_table"));
        Ok(())
    }

    #[tokio::test]
    async fn test_connect_gives_up_after_configured_attempts() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let settings = ConnectionSettings {
            path: dir
                .path()
                .join("no_such_dir/db.duckdb")
                .to_string_lossy()
                .into_owned(),
            read_only: true,
            connect_retries: 2,
            retry_interval_secs: 0,
        };

        let err = DuckDbExecutor::connect(&settings).await.err().unwrap();
        match err {
            InfrastructureError::Connection { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }
}
