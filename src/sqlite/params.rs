use rusqlite::types::Value;

use crate::error::StoreError;
use crate::types::{ParamConverter, RowValues};

/// Timestamp layout written to `SQLite` TEXT columns.
pub const TIMESTAMP_FORMAT: &str = "%F %T%.f";

/// Convert a single `RowValues` to a rusqlite `Value`.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Timestamp(dt) => Value::Text(dt.format(TIMESTAMP_FORMAT).to_string()),
        RowValues::Null => Value::Null,
    }
}

/// Owned `SQLite` parameters, movable onto the blocking pool.
#[derive(Debug, Clone)]
pub struct Params(pub Vec<Value>);

impl Params {
    /// Convert row values into `SQLite` values.
    ///
    /// # Errors
    /// Never fails today; kept fallible to match the backend converter contract.
    pub fn convert(params: &[RowValues]) -> Result<Self, StoreError> {
        Ok(Params(params.iter().map(row_value_to_sqlite_value).collect()))
    }

    /// Borrow the underlying values.
    #[must_use]
    pub fn as_values(&self) -> &[Value] {
        &self.0
    }
}

impl ParamConverter<'_> for Params {
    type Converted = Params;

    fn convert_sql_params(params: &[RowValues]) -> Result<Self::Converted, StoreError> {
        Self::convert(params)
    }
}
