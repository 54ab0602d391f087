use std::sync::Arc;

use crate::error::StoreError;
use crate::results::ResultSet;
use crate::statements::QueryShape;
use crate::types::DatabaseType;

use super::params::Params;
use super::query::build_result_set;
use super::session::{SharedSqliteConnection, SqliteHandle, run_blocking};

/// Handle to a statement held in the connection's prepared statement cache.
///
/// `rusqlite` statements borrow their connection, so the handle keeps the SQL text
/// and looks the compiled statement up with `prepare_cached` on each call; the
/// compile itself happened once, in [`SqlitePreparedStatement::prepare`].
#[derive(Clone, Debug)]
pub struct SqlitePreparedStatement {
    query: Arc<str>,
}

impl SqlitePreparedStatement {
    /// Compile `shape` into the connection's statement cache.
    ///
    /// # Errors
    /// Returns `StoreError` if `SQLite` rejects the statement (for example a missing table).
    pub(crate) async fn prepare(
        conn: SharedSqliteConnection,
        shape: QueryShape,
    ) -> Result<Self, StoreError> {
        let query: Arc<str> = Arc::from(shape.sql(DatabaseType::Sqlite));
        let warm = Arc::clone(&query);
        run_blocking(conn, move |guard| {
            guard.prepare_cached(&warm)?;
            Ok(())
        })
        .await?;
        Ok(Self { query })
    }

    pub(crate) async fn query(
        &self,
        handle: &SqliteHandle,
        params: Params,
    ) -> Result<ResultSet, StoreError> {
        let query = Arc::clone(&self.query);
        handle
            .run_statement(move |guard| {
                let mut stmt = guard.prepare_cached(&query)?;
                build_result_set(&mut stmt, params.as_values())
            })
            .await
    }

    pub(crate) async fn execute(
        &self,
        handle: &SqliteHandle,
        params: Params,
    ) -> Result<usize, StoreError> {
        let query = Arc::clone(&self.query);
        handle
            .run_statement(move |guard| {
                let mut stmt = guard.prepare_cached(&query)?;
                Ok(stmt.execute(rusqlite::params_from_iter(params.0.iter()))?)
            })
            .await
    }

    /// Execute an insert and read back the rowid it generated.
    pub(crate) async fn insert(
        &self,
        handle: &SqliteHandle,
        params: Params,
    ) -> Result<Option<i64>, StoreError> {
        let query = Arc::clone(&self.query);
        handle
            .run_statement(move |guard| {
                let inserted = {
                    let mut stmt = guard.prepare_cached(&query)?;
                    stmt.execute(rusqlite::params_from_iter(params.0.iter()))?
                };
                if inserted == 0 {
                    Ok(None)
                } else {
                    Ok(Some(guard.last_insert_rowid()))
                }
            })
            .await
    }
}
