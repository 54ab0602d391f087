use crate::error::StoreError;
use crate::model::{Account, User};
use crate::results::{CustomDbRow, ResultSet};

fn pin(row: &CustomDbRow) -> Result<i32, StoreError> {
    let pin = row.int("pin")?;
    i32::try_from(pin).map_err(|_| StoreError::ExecutionError(format!("pin {pin} out of range")))
}

pub(super) fn user_from_row(row: &CustomDbRow) -> Result<User, StoreError> {
    Ok(User::with_id(
        row.int("id")?,
        pin(row)?,
        row.text("first_name")?,
        row.text("last_name")?,
    ))
}

/// Map an account row joined with its owner's columns.
///
/// A null owner pin means the join found no user row for `user_id`.
pub(super) fn account_from_row(row: &CustomDbRow) -> Result<Account, StoreError> {
    let user_id = row.int("user_id")?;
    if row.get("pin").is_none_or(|v| v.is_null()) {
        return Err(StoreError::MissingOwner(user_id));
    }
    let owner = User::with_id(
        user_id,
        pin(row)?,
        row.text("first_name")?,
        row.text("last_name")?,
    );
    Ok(Account::with_id(
        row.int("id")?,
        owner,
        row.text("name")?,
        row.float("balance")?,
    ))
}

/// The single entity of a point lookup, or `None` for an empty result.
///
/// # Errors
/// `StoreError::NoResultSet` when the statement produced no result set at all.
pub(super) fn first<T>(
    result: &ResultSet,
    map: impl Fn(&CustomDbRow) -> Result<T, StoreError>,
) -> Result<Option<T>, StoreError> {
    if !result.has_result_set() {
        return Err(StoreError::NoResultSet);
    }
    result.results.first().map(map).transpose()
}

pub(super) fn all<T>(
    result: &ResultSet,
    map: impl Fn(&CustomDbRow) -> Result<T, StoreError>,
) -> Result<Vec<T>, StoreError> {
    result.results.iter().map(map).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::RowValues;

    fn account_result(owner_pin: RowValues) -> ResultSet {
        let mut rs = ResultSet::with_capacity(1);
        rs.set_column_names(Arc::new(
            ["id", "user_id", "name", "balance", "pin", "first_name", "last_name"]
                .map(String::from)
                .to_vec(),
        ));
        let (first, last) = if owner_pin.is_null() {
            (RowValues::Null, RowValues::Null)
        } else {
            (RowValues::Text("Ada".into()), RowValues::Text("Lovelace".into()))
        };
        rs.add_row_values(vec![
            RowValues::Int(7),
            RowValues::Int(3),
            RowValues::Text("checking".into()),
            RowValues::Float(12.5),
            owner_pin,
            first,
            last,
        ]);
        rs
    }

    #[test]
    fn maps_joined_account_row() {
        let rs = account_result(RowValues::Int(1234));
        let account = first(&rs, account_from_row).unwrap().unwrap();
        assert_eq!(account.id().get(), Some(7));
        assert_eq!(account.name(), "checking");
        assert!((account.balance() - 12.5).abs() < f64::EPSILON);
        assert_eq!(account.user(), &User::with_id(3_i64, 1234, "Ada", "Lovelace"));
    }

    #[test]
    fn dangling_owner_is_reported() {
        let rs = account_result(RowValues::Null);
        let err = all(&rs, account_from_row).unwrap_err();
        assert!(matches!(err, StoreError::MissingOwner(3)));
    }

    #[test]
    fn empty_and_missing_result_sets() {
        let mut rs = ResultSet::with_capacity(0);
        assert!(matches!(first(&rs, user_from_row), Err(StoreError::NoResultSet)));

        rs.set_column_names(Arc::new(vec!["id".to_string()]));
        assert!(first(&rs, user_from_row).unwrap().is_none());
    }

    #[test]
    fn pin_out_of_range() {
        let mut rs = ResultSet::with_capacity(1);
        rs.set_column_names(Arc::new(
            ["id", "pin", "first_name", "last_name"].map(String::from).to_vec(),
        ));
        rs.add_row_values(vec![
            RowValues::Int(1),
            RowValues::Int(i64::from(i32::MAX) + 1),
            RowValues::Text("a".into()),
            RowValues::Text("b".into()),
        ]);
        assert!(matches!(all(&rs, user_from_row), Err(StoreError::ExecutionError(_))));
    }
}
