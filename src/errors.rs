use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::Collection;

/// Errors raised by a [`crate::repositories::DocumentStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Collection unavailable: {0}")]
    Unavailable(Collection),

    #[error("Invalid dataset: {0}")]
    Dataset(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single related-collection lookup produced no data.
///
/// Never escapes a row: the lookup degrades to an empty result and the
/// failure is recorded as a diagnostic.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum LookupFailure {
    #[error("Lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Circuit breaker is open")]
    CircuitOpen,
}

impl LookupFailure {
    pub fn as_label(&self) -> &'static str {
        match self {
            LookupFailure::Timeout(_) => "timeout",
            LookupFailure::Transport(_) => "transport",
            LookupFailure::CircuitOpen => "circuit_open",
        }
    }
}

impl From<StoreError> for LookupFailure {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Transport(message) => LookupFailure::Transport(message),
            other => LookupFailure::Transport(other.to_string()),
        }
    }
}

/// Errors returned by the reconciliation services.
#[derive(Debug, Error, Serialize)]
pub enum ServiceError {
    /// The record lacks the attributes needed to build any lookup key.
    #[error("Invalid primary record: {0}")]
    InvalidPrimaryRecord(String),

    #[error("Invalid report window: {0}")]
    InvalidWindow(String),

    /// The primary collection could not be queried at all.
    #[error("Primary query failed: {0}")]
    PrimaryQuery(String),

    #[error("Report cancelled")]
    Cancelled,
}

impl ServiceError {
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::InvalidPrimaryRecord(_) => "invalid_primary_record",
            ServiceError::InvalidWindow(_) => "invalid_window",
            ServiceError::PrimaryQuery(_) => "primary_query",
            ServiceError::Cancelled => "cancelled",
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::PrimaryQuery(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_become_transport_failures() {
        let failure: LookupFailure = StoreError::Unavailable(Collection::Banks).into();
        assert_eq!(
            failure,
            LookupFailure::Transport("Collection unavailable: banks".to_string())
        );
        assert_eq!(failure.as_label(), "transport");
    }

    #[test]
    fn primary_query_errors_keep_their_message() {
        let err: ServiceError = StoreError::Transport("connection reset".into()).into();
        assert_eq!(
            err.to_string(),
            "Primary query failed: Transport failure: connection reset"
        );
    }
}
