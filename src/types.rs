use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Values bound into prepared statements or read back out of result rows.
///
/// Both backends share the same enum so the CRUD layer never branches on driver types:
/// ```rust
/// use atm_data::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1234),
///     RowValues::Text("Ada".into()),
///     RowValues::Float(100.25),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Integers are widened; `SQLite` may return whole-number REALs as integers.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            RowValues::Float(value) => Some(*value),
            RowValues::Int(value) => Some(*value as f64),
            _ => None,
        }
    }
}

/// The store backends this crate can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
pub enum DatabaseType {
    /// `PostgreSQL` over `tokio-postgres`
    Postgres,
    /// `SQLite` over `rusqlite`
    Sqlite,
}

impl DatabaseType {
    /// Whether support for this backend was compiled in.
    #[must_use]
    pub fn is_enabled(self) -> bool {
        match self {
            DatabaseType::Postgres => cfg!(feature = "postgres"),
            DatabaseType::Sqlite => cfg!(feature = "sqlite"),
        }
    }
}

/// Convert a slice of `RowValues` into a backend's native parameter container.
pub trait ParamConverter<'a> {
    type Converted;

    /// Convert a slice of `RowValues` into the backend's parameter type.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ParameterError` if a value cannot be represented by the backend.
    fn convert_sql_params(params: &'a [RowValues]) -> Result<Self::Converted, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_widen_from_integers() {
        assert_eq!(RowValues::Int(100).as_float(), Some(100.0));
        assert_eq!(RowValues::Float(12.5).as_float(), Some(12.5));
        assert_eq!(RowValues::Text("12.5".into()).as_float(), None);
    }
}
