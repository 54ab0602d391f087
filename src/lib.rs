//! Data access for the ATM service: users and accounts over prepared statements.
//!
//! A [`DataAccess`] handle owns one connection to `PostgreSQL` or `SQLite` and the full
//! set of prepared statements for it. Connect it once, then save, look up, list and delete
//! entities. Failures come back as [`AtmDataError`].
//!
//! ```no_run
//! # async fn demo() -> Result<(), atm_data::AtmDataError> {
//! use atm_data::prelude::*;
//!
//! let access = DataAccess::builder(SqliteTarget::new("atm.db")).connect().await?;
//! let mut user = User::new(1234, "Ada", "Lovelace");
//! access.save_user(&mut user).await?;
//! let id = user.id().get().unwrap_or_default();
//! assert_eq!(access.get_user_by_id(id).await?, Some(user));
//! # Ok(())
//! # }
//! ```

pub mod config;
mod crud;
pub mod error;
pub mod executor;
mod instance;
pub mod model;
pub mod prelude;
pub mod results;
pub mod session;
pub mod statements;
pub mod translation;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "test-utils-postgres")]
pub mod test_utils;

pub use config::{Credentials, PostgresTarget, SessionOptions, SqliteTarget, StoreTarget};
pub use error::{AtmDataError, StoreError};
pub use model::{Account, EntityId, User};
pub use session::{ConnectionHandle, DataAccess, DataAccessBuilder};
pub use types::DatabaseType;
