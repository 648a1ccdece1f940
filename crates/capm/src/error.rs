//! Error types for return and CAPM computations.

use thiserror::Error;

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, CapmError>;

/// Errors that can occur while analysing a price table.
#[derive(Debug, Error)]
pub enum CapmError {
    /// Empty or malformed input table
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A zero price makes the ratio for a column undefined
    #[error("Division by zero in column '{column}' at {date}")]
    DivisionByZero {
        /// Column holding the zero price
        column: String,
        /// Date of the zero price
        date: String,
    },

    /// Not enough observations, or no variation, to fit a regression
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Polars DataFrame error
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl CapmError {
    pub(crate) fn missing_column(name: &str) -> Self {
        Self::InvalidInput(format!("missing required column '{name}'"))
    }

    pub(crate) fn too_few_rows(required: usize, available: usize) -> Self {
        Self::InsufficientData(format!("need {required} rows, got {available}"))
    }
}
