use std::collections::HashMap;
use std::sync::Arc;

use crate::error::StoreError;
use crate::types::RowValues;

/// A row from a database query result
///
/// Column names and the name-to-index cache are shared by every row of the
/// owning [`ResultSet`](super::ResultSet).
#[derive(Debug, Clone)]
pub struct CustomDbRow {
    /// The column names for this row (shared across all rows in a result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub rows: Vec<RowValues>,
    #[doc(hidden)]
    pub(crate) column_index_cache: Arc<HashMap<String, usize>>,
}

impl CustomDbRow {
    /// Create a new database row, building its own column index cache.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, rows: Vec<RowValues>) -> Self {
        let cache = Arc::new(index_columns(&column_names));
        Self {
            column_names,
            rows,
            column_index_cache: cache,
        }
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.column_index_cache.get(column_name) {
            return Some(idx);
        }
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Get a value from the row by column name
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.rows.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.rows.get(index)
    }

    /// Read a non-null integer column.
    ///
    /// # Errors
    /// Returns `StoreError::ExecutionError` if the column is missing, NULL, or not an integer.
    pub fn int(&self, column_name: &str) -> Result<i64, StoreError> {
        self.require(column_name)?
            .as_int()
            .copied()
            .ok_or_else(|| column_type_error(column_name, "an integer"))
    }

    /// Read a non-null float column.
    ///
    /// # Errors
    /// Returns `StoreError::ExecutionError` if the column is missing, NULL, or not numeric.
    pub fn float(&self, column_name: &str) -> Result<f64, StoreError> {
        self.require(column_name)?
            .as_float()
            .ok_or_else(|| column_type_error(column_name, "a float"))
    }

    /// Read a non-null text column.
    ///
    /// # Errors
    /// Returns `StoreError::ExecutionError` if the column is missing, NULL, or not text.
    pub fn text(&self, column_name: &str) -> Result<&str, StoreError> {
        self.require(column_name)?
            .as_text()
            .ok_or_else(|| column_type_error(column_name, "text"))
    }

    fn require(&self, column_name: &str) -> Result<&RowValues, StoreError> {
        self.get(column_name).ok_or_else(|| {
            StoreError::ExecutionError(format!("column {column_name} missing from result row"))
        })
    }
}

pub(crate) fn index_columns(column_names: &[String]) -> HashMap<String, usize> {
    column_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect()
}

fn column_type_error(column_name: &str, expected: &str) -> StoreError {
    StoreError::ExecutionError(format!("column {column_name} is not {expected}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CustomDbRow {
        CustomDbRow::new(
            Arc::new(vec!["id".into(), "first_name".into(), "balance".into()]),
            vec![
                RowValues::Int(7),
                RowValues::Text("Ada".into()),
                RowValues::Null,
            ],
        )
    }

    #[test]
    fn typed_accessors_read_by_name() {
        let row = sample();
        assert_eq!(row.int("id").unwrap(), 7);
        assert_eq!(row.text("first_name").unwrap(), "Ada");
        assert_eq!(row.get_by_index(1), Some(&RowValues::Text("Ada".into())));
    }

    #[test]
    fn typed_accessors_reject_null_and_missing() {
        let row = sample();
        assert!(matches!(row.float("balance"), Err(StoreError::ExecutionError(_))));
        assert!(matches!(row.int("pin"), Err(StoreError::ExecutionError(_))));
        assert!(matches!(row.text("id"), Err(StoreError::ExecutionError(_))));
    }
}
