//! Error types for where-condition building.

use thiserror::Error;

use crate::operator::QueryOperator;

/// Errors that can occur while building a where condition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WhereError {
    /// The operator has no meaning for the given value.
    #[error("unsupported operation: operator '{operator}' {reason}")]
    UnsupportedOperation {
        /// The operator that was requested.
        operator: QueryOperator,
        /// Why it cannot be applied.
        reason: String,
    },

    /// A sub-query from another data source could not be materialized.
    #[error("sub-query materialization failed: {0}")]
    Materialization(String),
}

/// Result type for where-condition operations.
pub type WhereResult<T> = std::result::Result<T, WhereError>;
