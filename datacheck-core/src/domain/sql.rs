// datacheck-core/src/domain/sql.rs

// SQL fragments shared by the evaluators. Identifiers are passed through
// untouched (they come from trusted configuration); literal values are quoted.

/// Quotes a literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn count_rows(table: &str, where_clause: Option<&str>) -> String {
    match where_clause {
        Some(clause) if !clause.trim().is_empty() => {
            format!("SELECT COUNT(*) FROM {} WHERE {}", table, clause)
        }
        _ => format!("SELECT COUNT(*) FROM {}", table),
    }
}

pub fn count_non_null(table: &str, column: &str) -> String {
    format!("SELECT COUNT(*) FROM {} WHERE {} IS NOT NULL", table, column)
}

/// `a IS NOT NULL AND b IS NOT NULL ...`
pub fn all_not_null(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| format!("{} IS NOT NULL", c))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Text view of a column, so string functions work on any column type.
pub fn as_text(column: &str) -> String {
    format!("CAST({} AS VARCHAR)", column)
}

/// Renders a number without exponent so it can be inlined in SQL.
pub fn number_literal(value: f64) -> String {
    format!("{}", value)
}
