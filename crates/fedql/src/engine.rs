//! Query engine: source registry and execution.

use crate::config::{validate_statement, EngineConfig};
use fedql_core::query::{filter_rows, parse, Predicate, Query};
use fedql_core::{only_columns, Error, ResultSet, Result, Source, SourceRequest};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, trace, warn};

/// Columns and rows returned by `QueryEngine::execute`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Column names in display order
    pub columns: Vec<String>,
    /// Rows in source order
    pub results: ResultSet,
}

impl QueryResult {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// True when no rows matched
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Routes queries to registered sources.
///
/// Cloning is cheap and clones share one registry, so an engine can be handed to
/// several threads and sources registered while queries run.
///
/// # Examples
///
/// ```rust
/// use fedql::{MemorySource, QueryEngine};
/// use fedql::source::row;
///
/// let engine = QueryEngine::new();
/// engine.register_source(
///     "devops",
///     MemorySource::new().with_table(
///         "projects",
///         ["name", "url"],
///         vec![
///             row([("name", "website"), ("url", "https://dev/website")]),
///             row([("name", "api"), ("url", "https://dev/api")]),
///         ],
///     ),
/// )?;
///
/// let result = engine.query("SELECT name FROM devops.projects WHERE url LIKE '%api'")?;
/// assert_eq!(result.columns, vec!["name"]);
/// assert_eq!(result.results[0]["name"], "api");
/// # Ok::<(), fedql::Error>(())
/// ```
#[derive(Clone)]
pub struct QueryEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: EngineConfig,
    sources: RwLock<HashMap<String, Arc<dyn Source>>>,
}

impl QueryEngine {
    /// Creates an engine with the default configuration and no sources.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates an engine with custom configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        QueryEngine {
            inner: Arc::new(EngineInner {
                config,
                sources: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Registers a source under `name`.
    ///
    /// Names are case-insensitive. Registering a name twice is an error; use
    /// [`replace_source`](Self::replace_source) to swap an adapter out.
    pub fn register_source<S: Source + 'static>(&self, name: &str, source: S) -> Result<()> {
        let key = name.to_lowercase();
        let mut sources = self
            .inner
            .sources
            .write()
            .map_err(|_| Error::LockPoisoned)?;

        if sources.contains_key(&key) {
            return Err(Error::DuplicateSource(key));
        }

        info!(source = %key, "registered source");
        sources.insert(key, Arc::new(source));
        Ok(())
    }

    /// Registers a source under `name`, replacing any existing one.
    ///
    /// Returns `true` if a source was replaced.
    pub fn replace_source<S: Source + 'static>(&self, name: &str, source: S) -> Result<bool> {
        let key = name.to_lowercase();
        let mut sources = self
            .inner
            .sources
            .write()
            .map_err(|_| Error::LockPoisoned)?;

        let replaced = sources.insert(key.clone(), Arc::new(source)).is_some();
        info!(source = %key, replaced, "registered source");
        Ok(replaced)
    }

    /// Removes the source registered under `name`.
    ///
    /// Returns `true` if a source was removed.
    pub fn deregister_source(&self, name: &str) -> Result<bool> {
        let key = name.to_lowercase();
        let mut sources = self
            .inner
            .sources
            .write()
            .map_err(|_| Error::LockPoisoned)?;

        let removed = sources.remove(&key).is_some();
        if removed {
            info!(source = %key, "deregistered source");
        }
        Ok(removed)
    }

    /// Names of all registered sources, sorted.
    pub fn sources(&self) -> Result<Vec<String>> {
        let sources = self
            .inner
            .sources
            .read()
            .map_err(|_| Error::LockPoisoned)?;

        let mut names: Vec<String> = sources.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Validates, parses and executes a statement.
    pub fn query(&self, statement: &str) -> Result<QueryResult> {
        validate_statement(statement, self.inner.config.max_statement_length)?;
        let query = parse(statement)?;
        self.execute(&query)
    }

    /// Executes a parsed query against its source.
    ///
    /// Filters are re-applied to the adapter's rows (unless residual filtering is
    /// off), then rows are pruned to the requested columns and truncated to the
    /// limit. With no requested columns, the source's declared schema is reported
    /// and rows are left as returned.
    ///
    /// # Errors
    ///
    /// `Error::UnknownSource` if nothing is registered under the query's source
    /// name; adapter errors are returned unchanged.
    pub fn execute(&self, query: &Query) -> Result<QueryResult> {
        debug!(%query, "executing query");

        let source = self.resolve(&query.source_name)?;
        let residual = self.inner.config.residual_filtering && !query.filters.is_empty();

        let request_columns = if residual {
            columns_with_filter_fields(&query.columns, &query.filters)
        } else {
            query.columns.clone()
        };

        let request = SourceRequest {
            table: &query.table,
            columns: &request_columns,
            filters: &query.filters,
        };

        let mut results = source.get(&request)?;

        if residual {
            let fetched = results.len();
            results = filter_rows(&query.filters, results);
            trace!(fetched, kept = results.len(), "applied residual filters");
        }

        let columns = if query.columns.is_empty() {
            source.schema_for_table(&query.table)
        } else {
            only_columns(&mut results, &query.columns);
            query.columns.clone()
        };

        if query.limit > 0 {
            results.truncate(query.limit);
        }

        debug!(rows = results.len(), "query complete");

        Ok(QueryResult { columns, results })
    }

    fn resolve(&self, name: &str) -> Result<Arc<dyn Source>> {
        let key = name.to_lowercase();
        let sources = self
            .inner
            .sources
            .read()
            .map_err(|_| Error::LockPoisoned)?;

        match sources.get(&key) {
            Some(source) => Ok(Arc::clone(source)),
            None => {
                warn!(source = %key, "query names an unknown source");
                Err(Error::UnknownSource(key))
            }
        }
    }
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Requested columns widened with every field the filters read, so residual
/// filtering sees the values it needs. Empty stays empty (all columns).
fn columns_with_filter_fields(columns: &[String], filters: &[Predicate]) -> Vec<String> {
    let mut widened = columns.to_vec();
    if widened.is_empty() {
        return widened;
    }

    for filter in filters {
        for field in filter.fields() {
            if !widened.iter().any(|c| c == field) {
                widened.push(field.to_string());
            }
        }
    }

    widened
}
