use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{ErrorCode, InterruptHandle};
use tokio::sync::Mutex;

use crate::config::SqliteTarget;
use crate::error::StoreError;
use crate::executor::StatementExecutor;
use crate::results::ResultSet;
use crate::statements::{QueryShape, StatementRegistry};
use crate::types::{DatabaseType, ParamConverter, RowValues};

use super::config::open_connection;
use super::params::Params;
use super::prepared::SqlitePreparedStatement;

pub(crate) type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

fn join_error(e: &tokio::task::JoinError) -> StoreError {
    StoreError::ExecutionError(format!("sqlite spawn_blocking join error: {e}"))
}

/// Run synchronous `rusqlite` work on the blocking pool while holding the connection lock.
pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, StoreError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, StoreError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| join_error(&e))?
}

/// The connection plus what is needed to stop a statement that overruns its timeout.
pub(crate) struct SqliteHandle {
    conn: SharedSqliteConnection,
    interrupt: Arc<InterruptHandle>,
    statement_timeout: Duration,
}

impl SqliteHandle {
    /// Run one statement on the blocking pool, bounded by the statement timeout.
    ///
    /// On timeout the work is cancelled if it has not started and interrupted if it is
    /// running; either way the task is awaited, so a statement that completed anyway is
    /// reported as completed. Only work that never took effect yields
    /// `StoreError::Timeout`.
    pub(crate) async fn run_statement<F, R>(&self, func: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, StoreError> + Send + 'static,
        R: Send + 'static,
    {
        let limit = self.statement_timeout;
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let conn = Arc::clone(&self.conn);
        let mut task = tokio::task::spawn_blocking(move || {
            let mut guard = conn.blocking_lock();
            if flag.load(Ordering::SeqCst) {
                return Err(StoreError::Timeout(limit));
            }
            func(&mut guard)
        });

        match tokio::time::timeout(limit, &mut task).await {
            Ok(joined) => joined.map_err(|e| join_error(&e))?,
            Err(_) => {
                cancelled.store(true, Ordering::SeqCst);
                self.interrupt.interrupt();
                match task.await.map_err(|e| join_error(&e))? {
                    Err(StoreError::SqliteError(e))
                        if e.sqlite_error_code() == Some(ErrorCode::OperationInterrupted) =>
                    {
                        Err(StoreError::Timeout(limit))
                    }
                    outcome => outcome,
                }
            }
        }
    }
}

struct Live {
    handle: SqliteHandle,
    registry: StatementRegistry<SqlitePreparedStatement>,
}

/// `SQLite` connection plus its prepared statements.
pub struct SqliteSession {
    target: SqliteTarget,
    live: Option<Live>,
}

impl SqliteSession {
    /// Open `target` and prepare every query shape against it.
    ///
    /// `statement_timeout` bounds each statement and is also the busy timeout.
    ///
    /// # Errors
    /// Returns `StoreError` if the file cannot be opened or any statement fails to
    /// prepare; the connection is closed before returning in that case.
    pub async fn connect(
        target: &SqliteTarget,
        statement_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let path = target.path.clone();
        let conn = tokio::task::spawn_blocking(move || open_connection(&path, statement_timeout))
            .await
            .map_err(|e| StoreError::ConnectionError(format!("sqlite open join error: {e}")))??;
        let interrupt = Arc::new(conn.get_interrupt_handle());
        let conn: SharedSqliteConnection = Arc::new(Mutex::new(conn));

        let registry = StatementRegistry::prepare_all(|shape| {
            SqlitePreparedStatement::prepare(Arc::clone(&conn), shape)
        })
        .await?;

        Ok(Self {
            target: target.clone(),
            live: Some(Live {
                handle: SqliteHandle {
                    conn,
                    interrupt,
                    statement_timeout,
                },
                registry,
            }),
        })
    }

    fn live(&self) -> Result<&Live, StoreError> {
        self.live
            .as_ref()
            .ok_or_else(|| StoreError::ConnectionError("sqlite session is closed".into()))
    }

    fn bind(
        &self,
        shape: QueryShape,
        params: &[RowValues],
    ) -> Result<(&Live, &SqlitePreparedStatement, Params), StoreError> {
        let live = self.live()?;
        let stmt = live.registry.get(shape)?;
        shape.check_params(params)?;
        let params = <Params as ParamConverter>::convert_sql_params(params)?;
        Ok((live, stmt, params))
    }
}

impl fmt::Debug for SqliteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteSession")
            .field("path", &self.target.path)
            .field("open", &self.live.is_some())
            .finish()
    }
}

#[async_trait]
impl StatementExecutor for SqliteSession {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    fn prepared_count(&self) -> usize {
        self.live.as_ref().map_or(0, |live| live.registry.len())
    }

    async fn query(
        &self,
        shape: QueryShape,
        params: &[RowValues],
    ) -> Result<ResultSet, StoreError> {
        let (live, stmt, params) = self.bind(shape, params)?;
        stmt.query(&live.handle, params).await
    }

    async fn execute(&self, shape: QueryShape, params: &[RowValues]) -> Result<usize, StoreError> {
        let (live, stmt, params) = self.bind(shape, params)?;
        stmt.execute(&live.handle, params).await
    }

    async fn insert_returning_key(
        &self,
        shape: QueryShape,
        params: &[RowValues],
    ) -> Result<Option<i64>, StoreError> {
        let (live, stmt, params) = self.bind(shape, params)?;
        stmt.insert(&live.handle, params).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.live()?
            .handle
            .run_statement(|guard| {
                guard.query_row("SELECT 1", [], |_| Ok(()))?;
                Ok(())
            })
            .await
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        let Some(Live { handle, registry }) = self.live.take() else {
            return Ok(());
        };
        drop(registry);
        run_blocking(handle.conn, |guard| {
            guard.flush_prepared_statement_cache();
            Ok(())
        })
        .await
    }
}
