//! In-memory source adapter.
//!
//! Holds tables as plain rows and answers requests the way a remote adapter would:
//! filters are applied on the source side with the shared evaluator and rows are
//! pruned to the requested columns before they are handed back.

use fedql_core::query::{filter_rows, required_equality};
use fedql_core::{only_columns, Error, ResultSet, Result, Source, SourceRequest};
use std::collections::HashMap;

/// A source backed by in-memory tables
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<String, MemoryTable>,
}

#[derive(Debug, Clone, Default)]
struct MemoryTable {
    columns: Vec<String>,
    rows: ResultSet,
    /// Fields that must be pinned by an `Eq` filter before the table can be read
    required: Vec<String>,
}

impl MemorySource {
    /// Creates a source with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a table with its declared column order and rows.
    ///
    /// Table names are case-insensitive.
    pub fn with_table<I, S>(mut self, name: &str, columns: I, rows: ResultSet) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let table = self.tables.entry(name.to_lowercase()).or_default();
        table.columns = columns.into_iter().map(Into::into).collect();
        table.rows = rows;
        self
    }

    /// Refuses requests on `table` that do not pin `field` with an equality filter.
    ///
    /// `field` is matched lower-cased, the way the parser writes filter fields.
    ///
    /// Mirrors APIs that can only list a collection inside one parent, e.g.
    /// pipelines inside a project.
    pub fn require_equality(mut self, table: &str, field: &str) -> Self {
        self.tables
            .entry(table.to_lowercase())
            .or_default()
            .required
            .push(field.to_lowercase());
        self
    }
}

impl Source for MemorySource {
    fn schema_for_table(&self, table: &str) -> Vec<String> {
        self.tables
            .get(&table.to_lowercase())
            .map(|t| t.columns.clone())
            .unwrap_or_default()
    }

    fn get(&self, request: &SourceRequest<'_>) -> Result<ResultSet> {
        let Some(table) = self.tables.get(&request.table.to_lowercase()) else {
            return Ok(ResultSet::new());
        };

        for field in &table.required {
            if required_equality(request.filters, field).is_none() {
                return Err(Error::Source(format!(
                    "table '{}' can only be queried with an equality filter on '{}'",
                    request.table, field
                )));
            }
        }

        let mut rows = filter_rows(request.filters, table.rows.clone());
        only_columns(&mut rows, request.columns);
        Ok(rows)
    }
}
