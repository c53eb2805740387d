//! Source adapter contract.
//!
//! A source is an external system (a REST API, a file, an in-memory table) that the
//! engine reaches through the [`Source`] trait. Adapters may push any subset of the
//! requested columns and filters down to the system they wrap; the engine re-applies
//! both on whatever comes back.

use crate::error::Result;
use crate::query::Predicate;
use std::collections::HashMap;

/// One row: column name to text value. Keys are case-sensitive.
pub type Row = HashMap<String, String>;

/// Rows in source order
pub type ResultSet = Vec<Row>;

/// What the engine asks an adapter for
#[derive(Debug, Clone, Copy)]
pub struct SourceRequest<'a> {
    /// Table within the source
    pub table: &'a str,
    /// Columns the engine needs; empty means all
    pub columns: &'a [String],
    /// Implicitly AND-ed filters the adapter may apply
    pub filters: &'a [Predicate],
}

/// A data source the engine can query.
///
/// Implementations must be shareable across threads; the engine holds them behind
/// an `Arc` and may serve concurrent queries.
pub trait Source: Send + Sync {
    /// Declared column order for `table`; empty for unknown tables
    fn schema_for_table(&self, table: &str) -> Vec<String>;

    /// Fetch rows for a request.
    ///
    /// Failures (network, auth, pagination) are reported as errors and handed back
    /// to the caller unchanged.
    fn get(&self, request: &SourceRequest<'_>) -> Result<ResultSet>;
}

/// Build a row from `(column, value)` pairs
///
/// ```
/// use fedql_core::source::row;
///
/// let r = row([("name", "Bob"), ("age", "30")]);
/// assert_eq!(r["name"], "Bob");
/// ```
pub fn row<I, K, V>(pairs: I) -> Row
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Prune every row in place to the given columns.
///
/// Does nothing when `columns` is empty. Requested columns a row lacks are not added.
pub fn only_columns(rows: &mut ResultSet, columns: &[String]) {
    if columns.is_empty() {
        return;
    }

    for row in rows.iter_mut() {
        row.retain(|column, _| columns.iter().any(|c| c == column));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build() -> Row {
        row([("startedby", "bob"), ("started", "monday"), ("ended", "wednesday")])
    }

    #[test]
    fn test_only_columns_prunes_in_place() {
        let mut rows = vec![build(), build()];
        only_columns(&mut rows, &["started".to_string(), "missing".to_string()]);

        for row in &rows {
            assert_eq!(row.len(), 1);
            assert_eq!(row["started"], "monday");
        }
    }

    #[test]
    fn test_only_columns_empty_keeps_everything() {
        let mut rows = vec![build()];
        only_columns(&mut rows, &[]);
        assert_eq!(rows[0].len(), 3);
    }
}
