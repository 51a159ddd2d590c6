//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to the document store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No client could be checked out of the pool.
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// The checked out client cannot serve requests.
    #[error("client unavailable: {0}")]
    ClientUnavailable(String),

    /// A collection handle could not be obtained.
    #[error("collection {database}.{collection} unavailable")]
    CollectionUnavailable {
        /// Database name.
        database: String,
        /// Collection name.
        collection: String,
    },

    /// An insert collided with an existing identity.
    #[error("duplicate key: {key}")]
    DuplicateKey {
        /// Rendered identity value.
        key: String,
    },

    /// The store rejected an operation.
    #[error("{operation} failed: {message}")]
    OperationFailed {
        /// Operation name.
        operation: String,
        /// Store-reported error text.
        message: String,
    },

    /// A query or update used an operator the backend does not evaluate.
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// A query or update document is malformed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl StoreError {
    /// Creates an operation failed error.
    pub fn operation_failed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }
}
