//! Convenient imports for common functionality.
//!
//! This module re-exports the types most callers need to configure a
//! [`DataAccess`](crate::DataAccess) handle and work with entities.

pub use crate::config::{Credentials, PostgresTarget, SessionOptions, SqliteTarget, StoreTarget};
pub use crate::error::{AtmDataError, StoreError};
pub use crate::model::{Account, EntityId, User};
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::session::{ConnectionHandle, DataAccess, DataAccessBuilder};
pub use crate::statements::QueryShape;
pub use crate::translation::sqlite_placeholders;
pub use crate::types::{DatabaseType, RowValues};
