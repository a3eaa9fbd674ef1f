//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Formula evaluation error
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Unknown function
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// A cell whose value depends on itself
    #[error("Circular reference detected at {0}")]
    CircularReference(String),

    /// Reference that cannot be resolved
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}
