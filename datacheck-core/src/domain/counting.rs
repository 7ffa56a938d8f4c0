// datacheck-core/src/domain/counting.rs

// Row counting for count-parity checks.
//
// Large tables are counted as a sum over contiguous primary-key ranges instead
// of a single COUNT(*): one extra catalog lookup plus range/chunk_size indexed
// counts, in exchange for never holding a full scan open. The catalog estimate
// only selects the strategy; it never leaks into the total.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;

use crate::error::DataCheckError;
use crate::ports::executor::{QueryExecutor, Value, value_as_i64, value_as_u64};

pub const DEFAULT_CHUNK_THRESHOLD: u64 = 500_000;
pub const DEFAULT_CHUNK_SIZE: u64 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountStrategy {
    Direct,
    Chunked,
    CustomQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, Validate)]
pub struct ChunkedCountPolicy {
    /// Estimated row count above which chunked counting kicks in.
    #[serde(default = "default_chunk_threshold")]
    pub chunk_threshold: u64,

    #[validate(range(min = 1))]
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
}

impl Default for ChunkedCountPolicy {
    fn default() -> Self {
        Self {
            chunk_threshold: DEFAULT_CHUNK_THRESHOLD,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

fn default_chunk_threshold() -> u64 {
    DEFAULT_CHUNK_THRESHOLD
}
fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

impl ChunkedCountPolicy {
    /// Counts `table`, choosing between a direct and a chunked count.
    /// A filter always forces the direct count.
    pub async fn count<E: QueryExecutor + ?Sized>(
        &self,
        executor: &E,
        table: &str,
        key_column: &str,
        filter: Option<&str>,
    ) -> Result<(u64, CountStrategy), DataCheckError> {
        let filtered = filter.is_some_and(|f| !f.trim().is_empty());

        if !filtered {
            let estimate = executor.approximate_count(table).await?;
            if let Some(estimate) = estimate.filter(|n| *n > self.chunk_threshold) {
                info!(
                    table,
                    estimate,
                    chunk_size = self.chunk_size,
                    "⚡ Large table detected, switching to chunked count"
                );
                let total = executor
                    .execute_chunked_count(table, key_column, self.chunk_size)
                    .await?;
                return Ok((total, CountStrategy::Chunked));
            }
        }

        let total = executor.execute_count(table, filter).await?;
        Ok((total, CountStrategy::Direct))
    }
}

/// Sums `COUNT(*)` over `[min(key), max(key)]` in windows of `chunk_size`.
/// An empty table (max absent or 0) returns 0 without issuing range counts.
pub async fn count_by_key_ranges<E: QueryExecutor + ?Sized>(
    executor: &E,
    table: &str,
    key_column: &str,
    chunk_size: u64,
) -> Result<u64, DataCheckError> {
    let chunk = i64::try_from(chunk_size.max(1)).unwrap_or(i64::MAX);

    let min_key = key_bound(executor, "MIN", table, key_column).await?.unwrap_or(0);
    let max_key = match key_bound(executor, "MAX", table, key_column).await? {
        Some(max) if max != 0 => max,
        _ => return Ok(0),
    };

    let range_query = format!(
        "SELECT COUNT(*) FROM {} WHERE {} BETWEEN ? AND ?",
        table, key_column
    );

    let mut total = 0u64;
    let mut start = min_key;
    let mut chunks = 0u64;
    while start <= max_key {
        let end = start.saturating_add(chunk - 1);
        let count = executor
            .execute_scalar(&range_query, &[Value::from(start), Value::from(end)])
            .await?;
        total += count.as_ref().and_then(value_as_u64).unwrap_or(0);
        chunks += 1;

        if end == i64::MAX {
            break;
        }
        start = end + 1;
    }

    debug!(table, total, chunks, "Chunked count finished");
    Ok(total)
}

async fn key_bound<E: QueryExecutor + ?Sized>(
    executor: &E,
    aggregate: &str,
    table: &str,
    key_column: &str,
) -> Result<Option<i64>, DataCheckError> {
    let query = format!("SELECT {}({}) FROM {}", aggregate, key_column, table);
    match executor.execute_scalar(&query, &[]).await? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value_as_i64(&value).map(Some).ok_or_else(|| {
            DataCheckError::InternalError(format!(
                "Key column {}.{} is not integral (got {}), chunked count needs an integer key",
                table,
                key_column,
                value
            ))
        }),
    }
}

/// Direct count of a custom `SELECT COUNT(...)` style query.
pub async fn count_from_query<E: QueryExecutor + ?Sized>(
    executor: &E,
    query: &str,
) -> Result<u64, DataCheckError> {
    let value = executor.execute_scalar(query, &[]).await?;
    Ok(value.as_ref().and_then(value_as_u64).unwrap_or(0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ports::testing::ScriptedExecutor;
    use anyhow::Result;
    use serde_json::json;

    fn ranged_table(min: i64, max: i64, approx: Option<u64>) -> ScriptedExecutor {
        ScriptedExecutor::new()
            .with_approximate_count(approx)
            .with_scalar(move |sql, params| {
                if sql.starts_with("SELECT MIN") {
                    Some(json!(min))
                } else if sql.starts_with("SELECT MAX") {
                    Some(json!(max))
                } else if sql.contains("BETWEEN") {
                    let lo = params[0].as_i64().unwrap().max(min);
                    let hi = params[1].as_i64().unwrap().min(max);
                    Some(json!((hi - lo + 1).max(0)))
                } else {
                    Some(json!(-1))
                }
            })
    }

    #[tokio::test]
    async fn test_chunked_count_includes_short_last_chunk() -> Result<()> {
        let exec = ranged_table(1, 250_000, None);

        let total = count_by_key_ranges(&exec, "big", "id", 100_000).await?;

        assert_eq!(total, 250_000);
        let ranges = exec.calls_containing("BETWEEN");
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[2].1, vec![json!(200_001), json!(300_000)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_chunked_count_empty_table_short_circuits() -> Result<()> {
        let exec = ScriptedExecutor::new().with_scalar(|_, _| Some(Value::Null));

        let total = count_by_key_ranges(&exec, "empty", "id", 10).await?;

        assert_eq!(total, 0);
        assert!(exec.calls_containing("BETWEEN").is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_policy_uses_chunks_above_threshold() -> Result<()> {
        let exec = ranged_table(1, 600_001, Some(600_001));

        let (total, strategy) = ChunkedCountPolicy::default()
            .count(&exec, "big", "id", None)
            .await?;

        assert_eq!(strategy, CountStrategy::Chunked);
        assert_eq!(total, 600_001);
        assert_eq!(exec.calls_containing("BETWEEN").len(), 7);
        Ok(())
    }

    #[tokio::test]
    async fn test_policy_filter_forces_direct_count() -> Result<()> {
        let exec = ranged_table(1, 600_001, Some(600_001)).with_scalar(|sql, _| {
            assert!(sql.contains("WHERE status = 'ok'"));
            Some(json!(12))
        });

        let (total, strategy) = ChunkedCountPolicy::default()
            .count(&exec, "big", "id", Some("status = 'ok'"))
            .await?;

        assert_eq!(strategy, CountStrategy::Direct);
        assert_eq!(total, 12);
        Ok(())
    }

    #[tokio::test]
    async fn test_policy_small_table_counts_directly() -> Result<()> {
        let exec = ranged_table(1, 10, Some(10)).with_scalar(|_, _| Some(json!(10)));

        let (total, strategy) = ChunkedCountPolicy::default()
            .count(&exec, "small", "id", None)
            .await?;

        assert_eq!(strategy, CountStrategy::Direct);
        assert_eq!(total, 10);
        assert!(exec.calls_containing("BETWEEN").is_empty());
        Ok(())
    }
}
