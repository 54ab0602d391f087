use std::time::Duration;

use thiserror::Error;

/// Store-level failure raised by a backend while preparing or executing a statement.
///
/// These never leave the crate on their own: the session and CRUD layers wrap them
/// into [`AtmDataError`] and keep them reachable only through `Error::source`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("failed to prepare {shape}: {source}")]
    PrepareError {
        shape: &'static str,
        #[source]
        source: Box<StoreError>,
    },

    #[error("no generated id")]
    NoGeneratedKey,

    #[error("not found")]
    NoResultSet,

    #[error("owner not found (user id {0})")]
    MissingOwner(i64),

    #[error("owning user has not been saved")]
    UnsavedOwner,

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors surfaced by the data-access layer.
#[derive(Debug, Error)]
pub enum AtmDataError {
    /// Invalid configuration, detected before any I/O.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Connecting or preparing the statement registry failed. The session is left
    /// disconnected; `connect()` may be retried.
    #[error("Connection error ({target}): {source}")]
    ConnectionError {
        target: String,
        #[source]
        source: StoreError,
    },

    /// A CRUD operation was called before `connect()` (or after `close()`).
    #[error("Not connected: {operation} called before connect()")]
    NotConnectedError { operation: &'static str },

    /// `connect()` on a handle that was replaced as the process-wide instance.
    #[error("Retired: this instance was replaced and can no longer connect")]
    RetiredError,

    /// A single operation failed against the store.
    #[error("Data access error in {operation} ({key}): {source}")]
    DataAccessError {
        operation: &'static str,
        key: String,
        #[source]
        source: StoreError,
    },
}

impl AtmDataError {
    /// The underlying store failure, if this error wraps one.
    #[must_use]
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            AtmDataError::ConnectionError { source, .. }
            | AtmDataError::DataAccessError { source, .. } => Some(source),
            AtmDataError::ConfigError(_)
            | AtmDataError::NotConnectedError { .. }
            | AtmDataError::RetiredError => None,
        }
    }

    /// Name of the operation that failed, when known.
    #[must_use]
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            AtmDataError::NotConnectedError { operation }
            | AtmDataError::DataAccessError { operation, .. } => Some(operation),
            AtmDataError::RetiredError => Some("connect"),
            AtmDataError::ConfigError(_) | AtmDataError::ConnectionError { .. } => None,
        }
    }
}
