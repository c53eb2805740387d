//! # fedql
//!
//! One constrained SQL front end over many data sources.
//!
//! A statement such as
//!
//! ```sql
//! SELECT name, url FROM devops.projects WHERE name LIKE 'web%' OR name = 'api' LIMIT 10
//! ```
//!
//! is parsed into a [`Query`] naming a source (`devops`), a table (`projects`), the
//! requested columns, a row limit and a tree of [`Predicate`]s. The [`QueryEngine`]
//! hands the query to the adapter registered under that source name, re-applies the
//! filters to whatever the adapter returns, prunes the rows to the requested columns
//! and applies the limit.
//!
//! ## Quick Start
//!
//! ```rust
//! use fedql::source::row;
//! use fedql::{MemorySource, QueryEngine};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = QueryEngine::new();
//! engine.register_source(
//!     "devops",
//!     MemorySource::new().with_table(
//!         "builds",
//!         ["startedby", "started", "ended"],
//!         vec![
//!             row([("startedby", "bob"), ("started", "monday"), ("ended", "wednesday")]),
//!             row([("startedby", "alice"), ("started", "thursday"), ("ended", "friday")]),
//!         ],
//!     ),
//! )?;
//!
//! let result = engine.query("SELECT started FROM devops.builds WHERE startedby = 'ALICE'")?;
//! assert_eq!(result.columns, vec!["started"]);
//! assert_eq!(result.results[0]["started"], "thursday");
//! # Ok(())
//! # }
//! ```
//!
//! ## Supported statements
//!
//! - `SELECT *` or a column list, `FROM source.table`
//! - `WHERE` with `=`, `!=`/`<>`, `LIKE` (`%` wildcards), `AND`, `OR` and parentheses
//! - `LIMIT n`
//!
//! Comparisons are case-insensitive. Anything else is rejected with a
//! [`ParseError`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod engine;
pub mod logging;
pub mod memory;

// Re-export core types
pub use fedql_core::query;
pub use fedql_core::source;
pub use fedql_core::{
    parse, ComparisonOp, Error, LogicalOp, ParseError, Predicate, Query, Result, ResultSet, Row,
    Source, SourceRequest,
};

pub use config::EngineConfig;
pub use engine::{QueryEngine, QueryResult};
pub use memory::MemorySource;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
