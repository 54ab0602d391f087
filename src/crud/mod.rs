//! User and account persistence on top of the statement registry.

mod account;
mod rows;
mod user;

use chrono::Utc;

use crate::error::{AtmDataError, StoreError};
use crate::results::ResultSet;
use crate::session::DataAccess;
use crate::statements::QueryShape;
use crate::types::RowValues;

/// Wrap a store failure with the operation and key, logging it once.
fn data_access_error(operation: &'static str, key: String, source: StoreError) -> AtmDataError {
    tracing::warn!(operation, key = %key, error = %source, "data access failed");
    AtmDataError::DataAccessError {
        operation,
        key,
        source,
    }
}

fn update_timestamp() -> RowValues {
    RowValues::Timestamp(Utc::now().naive_utc())
}

impl DataAccess {
    /// Run a row-returning shape under the session lock.
    async fn run_query(
        &self,
        operation: &'static str,
        key: impl FnOnce() -> String,
        shape: QueryShape,
        params: &[RowValues],
    ) -> Result<ResultSet, AtmDataError> {
        let session = self.session(operation).await?;
        tracing::debug!(operation, shape = shape.name(), "executing");
        session
            .executor
            .query(shape, params)
            .await
            .map_err(|e| data_access_error(operation, key(), e))
    }

    async fn run_execute(
        &self,
        operation: &'static str,
        key: impl FnOnce() -> String,
        shape: QueryShape,
        params: &[RowValues],
    ) -> Result<usize, AtmDataError> {
        let session = self.session(operation).await?;
        tracing::debug!(operation, shape = shape.name(), "executing");
        session
            .executor
            .execute(shape, params)
            .await
            .map_err(|e| data_access_error(operation, key(), e))
    }

    /// Run an insert shape and return the generated key.
    async fn run_insert(
        &self,
        operation: &'static str,
        key: impl FnOnce() -> String,
        shape: QueryShape,
        params: &[RowValues],
    ) -> Result<i64, AtmDataError> {
        let session = self.session(operation).await?;
        tracing::debug!(operation, shape = shape.name(), "executing");
        session
            .executor
            .insert_returning_key(shape, params)
            .await
            .and_then(|id| id.ok_or(StoreError::NoGeneratedKey))
            .map_err(|e| data_access_error(operation, key(), e))
    }
}
