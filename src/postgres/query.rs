use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Client, Row, Statement};

use crate::error::StoreError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Execute a prepared statement and collect every row.
///
/// # Errors
/// Returns errors from query execution or result processing.
pub async fn build_result_set(
    stmt: &Statement,
    params: &[&(dyn ToSql + Sync)],
    client: &Client,
) -> Result<ResultSet, StoreError> {
    let rows = client.query(stmt, params).await?;

    let column_names: Vec<String> = stmt
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();
    let col_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(rows.len());
    result_set.set_column_names(Arc::new(column_names));

    for row in rows {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(postgres_extract_value(&row, i)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

/// Extracts a `RowValues` from a `tokio_postgres` Row at the given index.
///
/// # Errors
/// Returns `StoreError` if the column cannot be read as its declared type.
pub fn postgres_extract_value(row: &Row, idx: usize) -> Result<RowValues, StoreError> {
    let type_info = row.columns()[idx].type_();

    if *type_info == Type::INT2 {
        let val: Option<i16> = row.try_get(idx)?;
        Ok(val.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))))
    } else if *type_info == Type::INT4 {
        let val: Option<i32> = row.try_get(idx)?;
        Ok(val.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))))
    } else if *type_info == Type::INT8 {
        let val: Option<i64> = row.try_get(idx)?;
        Ok(val.map_or(RowValues::Null, RowValues::Int))
    } else if *type_info == Type::FLOAT4 {
        let val: Option<f32> = row.try_get(idx)?;
        Ok(val.map_or(RowValues::Null, |v| RowValues::Float(f64::from(v))))
    } else if *type_info == Type::FLOAT8 {
        let val: Option<f64> = row.try_get(idx)?;
        Ok(val.map_or(RowValues::Null, RowValues::Float))
    } else if *type_info == Type::TIMESTAMP {
        let val: Option<NaiveDateTime> = row.try_get(idx)?;
        Ok(val.map_or(RowValues::Null, RowValues::Timestamp))
    } else {
        // text, varchar, bpchar, name
        let val: Option<String> = row.try_get(idx)?;
        Ok(val.map_or(RowValues::Null, RowValues::Text))
    }
}
