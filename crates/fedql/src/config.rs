//! Engine configuration and statement validation.

use fedql_core::{Error, Result};

/// Default cap on statement length (1 MiB)
pub const DEFAULT_MAX_STATEMENT_LENGTH: usize = 1024 * 1024;

/// Engine configuration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Re-apply every filter to the rows an adapter returns.
    ///
    /// Adapters are free to ignore filters they cannot push down; with this on,
    /// the result is correct either way.
    pub residual_filtering: bool,
    /// Longest statement `QueryEngine::query` accepts, in bytes
    pub max_statement_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            residual_filtering: true,
            max_statement_length: DEFAULT_MAX_STATEMENT_LENGTH,
        }
    }
}

impl EngineConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Trust adapters to apply every filter themselves
    pub fn without_residual_filtering(mut self) -> Self {
        self.residual_filtering = false;
        self
    }

    /// Set the maximum statement length
    pub fn with_max_statement_length(mut self, max: usize) -> Self {
        self.max_statement_length = max;
        self
    }
}

/// Validates statement text before it reaches the parser
///
/// # Errors
///
/// Returns `Error::InvalidInput` for blank statements and statements longer than
/// `max_length` bytes.
pub fn validate_statement(statement: &str, max_length: usize) -> Result<()> {
    if statement.trim().is_empty() {
        return Err(Error::InvalidInput("Statement cannot be empty".to_string()));
    }

    if statement.len() > max_length {
        return Err(Error::InvalidInput(format!(
            "Statement length {} exceeds maximum {}",
            statement.len(),
            max_length
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.residual_filtering);
        assert_eq!(config.max_statement_length, 1024 * 1024);
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::new()
            .without_residual_filtering()
            .with_max_statement_length(64);
        assert!(!config.residual_filtering);
        assert_eq!(config.max_statement_length, 64);
    }

    #[test]
    fn test_validate_statement() {
        assert!(validate_statement("SELECT * FROM s.t", 100).is_ok());
        assert!(matches!(
            validate_statement("   \n", 100),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            validate_statement("SELECT * FROM s.t", 5),
            Err(Error::InvalidInput(_))
        ));
    }
}
