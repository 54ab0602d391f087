//! The session manager: one connection and one statement registry per handle.
//!
//! All statement execution on a [`DataAccess`] is serialized by a single async mutex
//! that guards the live session, so prepared handles are never used concurrently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use crate::config::{Credentials, SessionOptions, StoreTarget};
use crate::error::{AtmDataError, StoreError};
use crate::executor::StatementExecutor;
use crate::types::DatabaseType;

pub(crate) struct LiveSession {
    pub(crate) executor: Box<dyn StatementExecutor>,
    connected_at: DateTime<Utc>,
}

struct SessionState {
    credentials: Credentials,
    session: Option<LiveSession>,
}

/// Access point to the store for users and accounts.
///
/// Construct one per process (or use [`DataAccess::instance`]), call
/// [`connect`](Self::connect) once, then issue CRUD calls.
pub struct DataAccess {
    target: StoreTarget,
    options: SessionOptions,
    state: Mutex<SessionState>,
    retired: AtomicBool,
}

impl std::fmt::Debug for DataAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataAccess")
            .field("target", &self.target)
            .field("options", &self.options)
            .field("retired", &self.is_retired())
            .finish_non_exhaustive()
    }
}

impl DataAccess {
    #[must_use]
    pub fn new(target: StoreTarget, credentials: Credentials, options: SessionOptions) -> Self {
        Self {
            target,
            options,
            state: Mutex::new(SessionState {
                credentials,
                session: None,
            }),
            retired: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn builder(target: impl Into<StoreTarget>) -> DataAccessBuilder {
        DataAccessBuilder::new(target)
    }

    #[must_use]
    pub fn target(&self) -> &StoreTarget {
        &self.target
    }

    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub async fn credentials(&self) -> Credentials {
        self.state.lock().await.credentials.clone()
    }

    /// Whether this handle was replaced as the process-wide instance.
    ///
    /// A retired handle refuses `connect()`.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    pub(crate) fn retire(&self) {
        self.retired.store(true, Ordering::SeqCst);
    }

    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.session.is_some()
    }

    /// Connect with the stored credentials and prepare every statement.
    ///
    /// Calling `connect` on a connected handle does nothing.
    ///
    /// # Errors
    /// Returns `AtmDataError::ConfigError` for an invalid target,
    /// `AtmDataError::RetiredError` for a replaced process-wide instance and
    /// `AtmDataError::ConnectionError` if connecting, authenticating or preparing any
    /// statement fails or exceeds `connect_timeout`. On error the handle stays
    /// disconnected with no statements prepared.
    pub async fn connect(&self) -> Result<(), AtmDataError> {
        self.target.validate()?;
        let mut state = self.state.lock().await;
        if self.is_retired() {
            tracing::warn!(
                database = ?self.target.database_type(),
                "connect on a retired instance"
            );
            return Err(AtmDataError::RetiredError);
        }
        if state.session.is_some() {
            tracing::debug!(
                database = ?self.target.database_type(),
                "connect called on a connected session"
            );
            return Ok(());
        }

        let display_url = self.target.redacted_connection_string(&state.credentials);
        let opened = tokio::time::timeout(
            self.options.connect_timeout,
            open_executor(&self.target, &state.credentials, &self.options),
        )
        .await
        .unwrap_or(Err(StoreError::Timeout(self.options.connect_timeout)));

        match opened {
            Ok(executor) => {
                tracing::info!(
                    target_url = %display_url,
                    prepared = executor.prepared_count(),
                    "connection established"
                );
                state.session = Some(LiveSession {
                    executor,
                    connected_at: Utc::now(),
                });
                Ok(())
            }
            Err(source) => {
                tracing::error!(target_url = %display_url, error = %source, "connection failed");
                Err(AtmDataError::ConnectionError {
                    target: display_url,
                    source,
                })
            }
        }
    }

    /// Release the connection and its prepared statements.
    ///
    /// The handle can be connected again afterwards; CRUD calls in between fail with
    /// `NotConnectedError`.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        close_session(&mut state).await;
    }

    /// Close the current connection, if any, and switch to `credentials`.
    ///
    /// The caller reconnects with [`connect`](Self::connect).
    pub async fn reconfigure(&self, credentials: Credentials) {
        let mut state = self.state.lock().await;
        close_session(&mut state).await;
        state.credentials = credentials;
    }

    /// Snapshot of the live connection, for health checks and diagnostics.
    ///
    /// # Errors
    /// Returns `AtmDataError::NotConnectedError` before `connect()`.
    pub async fn connection(&self) -> Result<ConnectionHandle<'_>, AtmDataError> {
        let state = self.state.lock().await;
        let session = state.session.as_ref().ok_or(AtmDataError::NotConnectedError {
            operation: "connection",
        })?;
        Ok(ConnectionHandle {
            access: self,
            database_type: session.executor.database_type(),
            target: self.target.redacted_connection_string(&state.credentials),
            connected_at: session.connected_at,
            prepared_statements: session.executor.prepared_count(),
        })
    }

    /// Lock the live session for the duration of one operation.
    ///
    /// Statement timeouts are enforced by the executor, which reports the real outcome
    /// of a statement that completed despite overrunning.
    pub(crate) async fn session(
        &self,
        operation: &'static str,
    ) -> Result<MappedMutexGuard<'_, LiveSession>, AtmDataError> {
        let guard = self.state.lock().await;
        MutexGuard::try_map(guard, |state| state.session.as_mut()).map_err(|_| {
            tracing::warn!(operation, "called before connect");
            AtmDataError::NotConnectedError { operation }
        })
    }
}

async fn close_session(state: &mut SessionState) {
    if let Some(mut session) = state.session.take() {
        let database = session.executor.database_type();
        match session.executor.close().await {
            Ok(()) => tracing::info!(database = ?database, "connection closed"),
            Err(e) => {
                tracing::warn!(database = ?database, error = %e, "error while closing connection");
            }
        }
    }
}

async fn open_executor(
    target: &StoreTarget,
    #[cfg_attr(not(feature = "postgres"), allow(unused_variables))] credentials: &Credentials,
    options: &SessionOptions,
) -> Result<Box<dyn StatementExecutor>, StoreError> {
    match target {
        #[cfg(feature = "postgres")]
        StoreTarget::Postgres(pg) => {
            let session = crate::postgres::PostgresSession::connect(
                pg,
                credentials,
                options.connect_timeout,
                options.statement_timeout,
            )
            .await?;
            Ok(Box::new(session))
        }
        #[cfg(feature = "sqlite")]
        StoreTarget::Sqlite(sqlite) => {
            let session =
                crate::sqlite::SqliteSession::connect(sqlite, options.statement_timeout).await?;
            Ok(Box::new(session))
        }
        #[allow(unreachable_patterns)]
        other => Err(StoreError::ConnectionError(format!(
            "{:?} support is not enabled in this build",
            other.database_type()
        ))),
    }
}

/// Read-only view of a live connection.
#[derive(Debug)]
pub struct ConnectionHandle<'a> {
    access: &'a DataAccess,
    pub database_type: DatabaseType,
    /// Connection string with the password redacted.
    pub target: String,
    pub connected_at: DateTime<Utc>,
    pub prepared_statements: usize,
}

impl ConnectionHandle<'_> {
    /// Round-trip `SELECT 1` on the connection.
    ///
    /// # Errors
    /// Returns `NotConnectedError` if the session was closed since the handle was taken,
    /// or `DataAccessError` if the store does not answer.
    pub async fn ping(&self) -> Result<(), AtmDataError> {
        let session = self.access.session("ping").await?;
        session
            .executor
            .ping()
            .await
            .map_err(|source| AtmDataError::DataAccessError {
                operation: "ping",
                key: self.target.clone(),
                source,
            })
    }
}

/// Fluent builder for [`DataAccess`].
#[derive(Debug, Clone)]
pub struct DataAccessBuilder {
    target: StoreTarget,
    credentials: Credentials,
    options: SessionOptions,
}

impl DataAccessBuilder {
    #[must_use]
    pub fn new(target: impl Into<StoreTarget>) -> Self {
        Self {
            target: target.into(),
            credentials: Credentials::default(),
            options: SessionOptions::default(),
        }
    }

    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn statement_timeout(mut self, timeout: Duration) -> Self {
        self.options.statement_timeout = timeout;
        self
    }

    #[must_use]
    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Build a disconnected handle.
    #[must_use]
    pub fn finish(self) -> DataAccess {
        DataAccess::new(self.target, self.credentials, self.options)
    }

    /// Build a handle and connect it.
    ///
    /// # Errors
    /// Propagates any error from [`DataAccess::connect`].
    pub async fn connect(self) -> Result<DataAccess, AtmDataError> {
        let access = self.finish();
        access.connect().await?;
        Ok(access)
    }
}
