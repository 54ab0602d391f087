use crate::error::{AtmDataError, StoreError};
use crate::model::{Account, EntityId};
use crate::session::DataAccess;
use crate::statements::QueryShape;
use crate::types::RowValues;

use super::rows::{account_from_row, all, first};
use super::{data_access_error, update_timestamp};

impl DataAccess {
    /// Insert `account` if it has no id yet, otherwise update the row with its id.
    ///
    /// Only the owner's id is written. The owner must already be saved.
    ///
    /// # Errors
    /// `NotConnectedError` before `connect()`; `DataAccessError` if the owner is unsaved,
    /// the statement fails or times out, or an insert yields no generated id.
    pub async fn save_account(&self, account: &mut Account) -> Result<(), AtmDataError> {
        let key = match account.id() {
            EntityId::New => "new account".to_string(),
            EntityId::Persisted(id) => format!("account {id}"),
        };
        let Some(owner_id) = account.user().id().get() else {
            return Err(data_access_error("save_account", key, StoreError::UnsavedOwner));
        };

        let mut params = vec![
            RowValues::Int(owner_id),
            RowValues::Text(account.name().to_owned()),
            RowValues::Float(account.balance()),
            update_timestamp(),
        ];
        match account.id() {
            EntityId::New => {
                let id = self
                    .run_insert("save_account", || key, QueryShape::InsertAccount, &params)
                    .await?;
                account.set_id(id);
            }
            EntityId::Persisted(id) => {
                params.push(RowValues::Int(id));
                let affected = self
                    .run_execute("save_account", || key, QueryShape::UpdateAccount, &params)
                    .await?;
                if affected == 0 {
                    tracing::debug!(account_id = id, "update matched no account row");
                }
            }
        }
        Ok(())
    }

    /// The account with `id`, together with its owner.
    ///
    /// # Errors
    /// `NotConnectedError` before `connect()`; `DataAccessError` on store failure or when
    /// the owning user row is missing.
    pub async fn get_account(&self, id: i64) -> Result<Option<Account>, AtmDataError> {
        let key = || format!("account {id}");
        let result = self
            .run_query("get_account", key, QueryShape::SelectAccountById, &[RowValues::Int(id)])
            .await?;
        first(&result, account_from_row).map_err(|e| data_access_error("get_account", key(), e))
    }

    /// Every account with its owner, ordered by account id.
    ///
    /// # Errors
    /// `NotConnectedError` before `connect()`; `DataAccessError` on store failure or when
    /// any owning user row is missing.
    pub async fn get_all_accounts(&self) -> Result<Vec<Account>, AtmDataError> {
        let key = || "all accounts".to_string();
        let result = self
            .run_query("get_all_accounts", key, QueryShape::SelectAllAccounts, &[])
            .await?;
        all(&result, account_from_row).map_err(|e| data_access_error("get_all_accounts", key(), e))
    }
}
