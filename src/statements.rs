//! Query shapes and the per-connection registry of prepared statements.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use crate::error::StoreError;
use crate::translation::sqlite_placeholders;
use crate::types::{DatabaseType, RowValues};

const USER_COLUMNS: &str = r#"SELECT id, pin, first_name, last_name FROM "user""#;

const ACCOUNT_COLUMNS: &str = r#"SELECT a.id AS id, a.user_id AS user_id, a.name AS name,
a.balance AS balance, u.pin AS pin, u.first_name AS first_name, u.last_name AS last_name
FROM account a LEFT JOIN "user" u ON u.id = a.user_id"#;

/// Every statement the data-access layer executes.
///
/// Parameters are positional; [`QueryShape::param_count`] is checked on every bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryShape {
    /// pin, first name, last name, update timestamp
    InsertUser,
    SelectAllUsers,
    /// id
    SelectUserById,
    /// pin, first name, last name, update timestamp, id
    UpdateUser,
    /// id
    DeleteUser,
    /// id
    SelectAccountById,
    SelectAllAccounts,
    /// user id, name, balance, update timestamp
    InsertAccount,
    /// user id, name, balance, update timestamp, id
    UpdateAccount,
}

impl QueryShape {
    pub const ALL: [QueryShape; 9] = [
        QueryShape::InsertUser,
        QueryShape::SelectAllUsers,
        QueryShape::SelectUserById,
        QueryShape::UpdateUser,
        QueryShape::DeleteUser,
        QueryShape::SelectAccountById,
        QueryShape::SelectAllAccounts,
        QueryShape::InsertAccount,
        QueryShape::UpdateAccount,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            QueryShape::InsertUser => "insert-user",
            QueryShape::SelectAllUsers => "select-all-users",
            QueryShape::SelectUserById => "select-user-by-id",
            QueryShape::UpdateUser => "update-user",
            QueryShape::DeleteUser => "delete-user",
            QueryShape::SelectAccountById => "select-account-by-id",
            QueryShape::SelectAllAccounts => "select-all-accounts",
            QueryShape::InsertAccount => "insert-account",
            QueryShape::UpdateAccount => "update-account",
        }
    }

    #[must_use]
    pub fn param_count(self) -> usize {
        match self {
            QueryShape::SelectAllUsers | QueryShape::SelectAllAccounts => 0,
            QueryShape::SelectUserById
            | QueryShape::DeleteUser
            | QueryShape::SelectAccountById => 1,
            QueryShape::InsertUser | QueryShape::InsertAccount => 4,
            QueryShape::UpdateUser | QueryShape::UpdateAccount => 5,
        }
    }

    /// Inserts that hand back the store-assigned key.
    #[must_use]
    pub fn returns_generated_key(self) -> bool {
        matches!(self, QueryShape::InsertUser | QueryShape::InsertAccount)
    }

    fn base_sql(self) -> Cow<'static, str> {
        match self {
            QueryShape::InsertUser => Cow::Borrowed(concat!(
                r#"INSERT INTO "user" (pin, first_name, last_name, last_update) "#,
                "VALUES ($1, $2, $3, $4)",
            )),
            QueryShape::SelectAllUsers => Cow::Owned(format!("{USER_COLUMNS} ORDER BY id")),
            QueryShape::SelectUserById => Cow::Owned(format!("{USER_COLUMNS} WHERE id = $1")),
            QueryShape::UpdateUser => Cow::Borrowed(concat!(
                r#"UPDATE "user" SET pin = $1, first_name = $2, last_name = $3, "#,
                "last_update = $4 WHERE id = $5",
            )),
            QueryShape::DeleteUser => Cow::Borrowed(r#"DELETE FROM "user" WHERE id = $1"#),
            QueryShape::SelectAccountById => {
                Cow::Owned(format!("{ACCOUNT_COLUMNS} WHERE a.id = $1"))
            }
            QueryShape::SelectAllAccounts => {
                Cow::Owned(format!("{ACCOUNT_COLUMNS} ORDER BY a.id"))
            }
            QueryShape::InsertAccount => Cow::Borrowed(
                "INSERT INTO account (user_id, name, balance, last_update) VALUES ($1, $2, $3, $4)",
            ),
            QueryShape::UpdateAccount => Cow::Borrowed(concat!(
                "UPDATE account SET user_id = $1, name = $2, balance = $3, ",
                "last_update = $4 WHERE id = $5",
            )),
        }
    }

    /// SQL text for the given backend.
    ///
    /// Postgres inserts carry `RETURNING id`; `SQLite` reads the key from
    /// `last_insert_rowid` instead.
    #[must_use]
    pub fn sql(self, database_type: DatabaseType) -> String {
        let base = self.base_sql();
        match database_type {
            DatabaseType::Postgres if self.returns_generated_key() => {
                format!("{base} RETURNING id")
            }
            DatabaseType::Postgres => base.into_owned(),
            DatabaseType::Sqlite => sqlite_placeholders(&base).into_owned(),
        }
    }

    /// Verify the bound parameters match this shape's arity.
    ///
    /// # Errors
    /// Returns `StoreError::ParameterError` on a count mismatch.
    pub fn check_params(self, params: &[RowValues]) -> Result<(), StoreError> {
        if params.len() == self.param_count() {
            Ok(())
        } else {
            Err(StoreError::ParameterError(format!(
                "{} expects {} parameters, got {}",
                self.name(),
                self.param_count(),
                params.len()
            )))
        }
    }
}

impl fmt::Display for QueryShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One prepared handle per [`QueryShape`], built all at once.
///
/// A registry only exists fully populated: [`StatementRegistry::prepare_all`] either
/// prepares every shape or returns the first failure and drops what it had.
#[derive(Debug)]
pub struct StatementRegistry<H> {
    statements: HashMap<QueryShape, H>,
}

impl<H> StatementRegistry<H> {
    /// Prepare every shape in [`QueryShape::ALL`] order.
    ///
    /// # Errors
    /// Returns `StoreError::PrepareError` naming the first shape that failed.
    pub async fn prepare_all<F, Fut>(mut prepare: F) -> Result<Self, StoreError>
    where
        F: FnMut(QueryShape) -> Fut,
        Fut: Future<Output = Result<H, StoreError>>,
    {
        let mut statements = HashMap::with_capacity(QueryShape::ALL.len());
        for shape in QueryShape::ALL {
            let handle = prepare(shape).await.map_err(|source| StoreError::PrepareError {
                shape: shape.name(),
                source: Box::new(source),
            })?;
            tracing::debug!(shape = shape.name(), "statement prepared");
            statements.insert(shape, handle);
        }
        Ok(Self { statements })
    }

    /// The prepared handle for `shape`.
    ///
    /// # Errors
    /// Returns `StoreError::ExecutionError` if the shape was never prepared.
    pub fn get(&self, shape: QueryShape) -> Result<&H, StoreError> {
        self.statements.get(&shape).ok_or_else(|| {
            StoreError::ExecutionError(format!("statement {shape} is not prepared"))
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.statements.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_on<F: Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime")
            .block_on(fut)
    }

    #[test]
    fn sql_placeholders_match_param_counts() {
        for shape in QueryShape::ALL {
            let sql = shape.sql(DatabaseType::Postgres);
            for n in 1..=shape.param_count() {
                assert!(sql.contains(&format!("${n}")), "{shape} missing ${n}");
            }
            assert!(!sql.contains(&format!("${}", shape.param_count() + 1)));

            let sqlite = shape.sql(DatabaseType::Sqlite);
            assert!(!sqlite.contains('$'), "{shape}: {sqlite}");
        }
    }

    #[test]
    fn only_postgres_inserts_return_ids() {
        assert!(QueryShape::InsertUser.sql(DatabaseType::Postgres).ends_with("RETURNING id"));
        assert!(!QueryShape::InsertUser.sql(DatabaseType::Sqlite).contains("RETURNING"));
        assert!(!QueryShape::UpdateUser.sql(DatabaseType::Postgres).contains("RETURNING"));
    }

    #[test]
    fn check_params_rejects_wrong_arity() {
        assert!(QueryShape::DeleteUser.check_params(&[RowValues::Int(1)]).is_ok());
        let err = QueryShape::UpdateAccount
            .check_params(&[RowValues::Int(1)])
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::ParameterError(msg) if msg.contains("update-account expects 5")
        ));
    }

    #[test]
    fn prepare_all_populates_every_shape() {
        let registry = block_on(StatementRegistry::prepare_all(|shape| async move {
            Ok::<_, StoreError>(shape.name().len())
        }))
        .unwrap();
        assert_eq!(registry.len(), QueryShape::ALL.len());
        assert_eq!(*registry.get(QueryShape::InsertAccount).unwrap(), "insert-account".len());
    }

    #[test]
    fn prepare_all_is_all_or_nothing() {
        let mut attempted = Vec::new();
        let result = block_on(StatementRegistry::prepare_all(|shape| {
            attempted.push(shape);
            async move {
                if shape == QueryShape::SelectAccountById {
                    Err(StoreError::ExecutionError("no such table: account".into()))
                } else {
                    Ok(())
                }
            }
        }));
        match result {
            Err(StoreError::PrepareError { shape, .. }) => {
                assert_eq!(shape, "select-account-by-id");
            }
            other => panic!("expected prepare error, got {other:?}"),
        }
        assert_eq!(attempted.len(), 6);
    }
}
