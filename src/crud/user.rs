use crate::error::AtmDataError;
use crate::model::{EntityId, User};
use crate::session::DataAccess;
use crate::statements::QueryShape;
use crate::types::RowValues;

use super::rows::{all, first, user_from_row};
use super::{data_access_error, update_timestamp};

impl DataAccess {
    /// Insert `user` if it has no id yet, otherwise update the row with its id.
    ///
    /// On insert the generated id is written back into `user`. Updating an id that no
    /// longer exists changes nothing and is not an error.
    ///
    /// # Errors
    /// `NotConnectedError` before `connect()`; `DataAccessError` if the statement fails,
    /// times out, or an insert yields no generated id.
    pub async fn save_user(&self, user: &mut User) -> Result<(), AtmDataError> {
        let mut params = vec![
            RowValues::Int(i64::from(user.pin())),
            RowValues::Text(user.first_name().to_owned()),
            RowValues::Text(user.last_name().to_owned()),
            update_timestamp(),
        ];
        match user.id() {
            EntityId::New => {
                let id = self
                    .run_insert("save_user", || "new user".into(), QueryShape::InsertUser, &params)
                    .await?;
                user.set_id(id);
            }
            EntityId::Persisted(id) => {
                params.push(RowValues::Int(id));
                let key = || format!("user {id}");
                let affected = self
                    .run_execute("save_user", key, QueryShape::UpdateUser, &params)
                    .await?;
                if affected == 0 {
                    tracing::debug!(user_id = id, "update matched no user row");
                }
            }
        }
        Ok(())
    }

    /// # Errors
    /// `NotConnectedError` before `connect()`; `DataAccessError` on store failure.
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, AtmDataError> {
        let key = || format!("user {id}");
        let result = self
            .run_query("get_user_by_id", key, QueryShape::SelectUserById, &[RowValues::Int(id)])
            .await?;
        first(&result, user_from_row).map_err(|e| data_access_error("get_user_by_id", key(), e))
    }

    /// Every user, ordered by id.
    ///
    /// # Errors
    /// `NotConnectedError` before `connect()`; `DataAccessError` on store failure.
    pub async fn get_users(&self) -> Result<Vec<User>, AtmDataError> {
        let key = || "all users".to_string();
        let result = self
            .run_query("get_users", key, QueryShape::SelectAllUsers, &[])
            .await?;
        all(&result, user_from_row).map_err(|e| data_access_error("get_users", key(), e))
    }

    /// Delete the user with `id`. Deleting an absent id succeeds.
    ///
    /// Accounts are not cascaded: deleting a user that still owns accounts fails with
    /// a foreign key violation.
    ///
    /// # Errors
    /// `NotConnectedError` before `connect()`; `DataAccessError` on store failure.
    pub async fn delete_user_by_id(&self, id: i64) -> Result<(), AtmDataError> {
        let affected = self
            .run_execute(
                "delete_user_by_id",
                || format!("user {id}"),
                QueryShape::DeleteUser,
                &[RowValues::Int(id)],
            )
            .await?;
        if affected == 0 {
            tracing::debug!(user_id = id, "delete matched no user row");
        }
        Ok(())
    }
}
