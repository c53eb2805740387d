//! Error types for fedql.

use crate::query::ParseError;
use std::fmt;

/// The main error type for fedql operations.
#[derive(Debug)]
pub enum Error {
    /// A lock was poisoned (internal error)
    LockPoisoned,

    /// The statement could not be translated into a query
    Parse(ParseError),

    /// No source is registered under this name
    UnknownSource(String),

    /// A source is already registered under this name
    DuplicateSource(String),

    /// Failure reported by a source adapter
    Source(String),

    /// Input rejected before parsing
    InvalidInput(String),

    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LockPoisoned => write!(f, "Lock poisoned"),
            Error::Parse(e) => write!(f, "Parse error: {}", e),
            Error::UnknownSource(name) => write!(f, "Unknown source: '{}'", name),
            Error::DuplicateSource(name) => {
                write!(f, "Source '{}' is already registered", name)
            }
            Error::Source(msg) => write!(f, "Source error: {}", msg),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

/// A specialized `Result` type for fedql operations.
pub type Result<T> = std::result::Result<T, Error>;
