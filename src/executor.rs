use async_trait::async_trait;

use crate::error::StoreError;
use crate::results::ResultSet;
use crate::statements::QueryShape;
use crate::types::{DatabaseType, RowValues};

/// A live backend connection together with its prepared statement registry.
///
/// Implementations execute only registry statements; callers pick a [`QueryShape`]
/// and supply positional parameters in the order the shape documents.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    fn database_type(&self) -> DatabaseType;

    /// Number of statements held by the registry.
    fn prepared_count(&self) -> usize;

    /// Run a row-returning shape and materialise its rows.
    async fn query(&self, shape: QueryShape, params: &[RowValues])
    -> Result<ResultSet, StoreError>;

    /// Run a DML shape, returning rows affected.
    async fn execute(&self, shape: QueryShape, params: &[RowValues]) -> Result<usize, StoreError>;

    /// Run an insert shape and return the store-generated key, or `None` if the store
    /// reported none.
    async fn insert_returning_key(
        &self,
        shape: QueryShape,
        params: &[RowValues],
    ) -> Result<Option<i64>, StoreError>;

    /// Round-trip a trivial statement.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Release the registry and the connection. Further calls fail with
    /// `StoreError::ConnectionError`.
    async fn close(&mut self) -> Result<(), StoreError>;
}
