//! Error types for the realtime bridge.

use rtconf_codec::CodecError;
use rtconf_store::StoreError;
use thiserror::Error;

/// Result type for bridge operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in bridge operations.
///
/// No operation retries on any of these; the caller decides.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Connection parameters are missing or invalid.
    #[error("configuration error: {message}")]
    Configuration {
        /// What is wrong with the configuration.
        message: String,
    },

    /// A lookup term could not be translated into a query clause.
    #[error("cannot translate {term:?}: {reason}")]
    Translation {
        /// The offending term as given by the caller.
        term: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No client could be borrowed, or no pool is configured.
    #[error("client unavailable: {message}")]
    ClientUnavailable {
        /// Description from the pool.
        message: String,
    },

    /// The store rejected the operation.
    #[error("store error: {0}")]
    Store(#[source] StoreError),

    /// A value could not be converted.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A nested configuration load failed.
    #[error("include of {resource:?} failed: {reason}")]
    Include {
        /// The resource that was being included.
        resource: String,
        /// Why the load failed.
        reason: String,
    },
}

impl CoreError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a translation error.
    pub fn translation(term: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Translation {
            term: term.into(),
            reason: reason.into(),
        }
    }

    /// Create an include error.
    pub fn include(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Include {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the error came from the pool rather than the store.
    #[must_use]
    pub fn is_client_unavailable(&self) -> bool {
        matches!(self, Self::ClientUnavailable { .. })
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PoolExhausted => Self::ClientUnavailable {
                message: err.to_string(),
            },
            StoreError::ClientUnavailable(message) => Self::ClientUnavailable { message },
            other => Self::Store(other),
        }
    }
}
