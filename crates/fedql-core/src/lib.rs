//! # fedql Core
//!
//! Statement parser, predicate model and evaluator, and the source adapter contract
//! shared by the fedql engine and its adapters.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod query;
pub mod source;

pub use error::{Error, Result};
pub use query::{parse, ComparisonOp, LogicalOp, ParseError, Predicate, Query};
pub use source::{only_columns, row, ResultSet, Row, Source, SourceRequest};
