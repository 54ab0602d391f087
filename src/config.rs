use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AtmDataError;
use crate::types::DatabaseType;

const REDACTED: &str = "****";

/// User name and password used to authenticate against the store.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credentials {
    user: String,
    password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new("root", "root")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &REDACTED)
            .finish()
    }
}

/// Network location of a `PostgreSQL` store.
///
/// `schema` is the database name in the connection string; `options` are appended
/// verbatim as `key=value` query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgresTarget {
    pub host: String,
    pub port: u16,
    pub schema: String,
    pub options: Vec<(String, String)>,
}

impl Default for PostgresTarget {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            schema: "atm".to_string(),
            options: vec![("sslmode".to_string(), "disable".to_string())],
        }
    }
}

impl PostgresTarget {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, schema: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            schema: schema.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }

    /// Connection string without credentials.
    #[must_use]
    pub fn base_url(&self) -> String {
        let mut url = format!("postgresql://{}:{}/{}", self.host, self.port, self.schema);
        let options = self.options_query();
        if !options.is_empty() {
            url.push('?');
            url.push_str(&options);
        }
        url
    }

    fn options_query(&self) -> String {
        self.options
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// `user` and `password` must already be percent-encoded.
    fn render(&self, user: &str, password: &str) -> String {
        let mut url = format!(
            "postgresql://{}:{}/{}?user={user}&password={password}",
            self.host, self.port, self.schema
        );
        let options = self.options_query();
        if !options.is_empty() {
            url.push('&');
            url.push_str(&options);
        }
        url
    }
}

/// Location of a `SQLite` database file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteTarget {
    pub path: PathBuf,
}

impl SqliteTarget {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Where the data-access layer connects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreTarget {
    Postgres(PostgresTarget),
    Sqlite(SqliteTarget),
}

impl Default for StoreTarget {
    fn default() -> Self {
        StoreTarget::Postgres(PostgresTarget::default())
    }
}

impl StoreTarget {
    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        match self {
            StoreTarget::Postgres(_) => DatabaseType::Postgres,
            StoreTarget::Sqlite(_) => DatabaseType::Sqlite,
        }
    }

    /// Render `protocol://host/schema?user=<user>&password=<password>&<options>`.
    ///
    /// User and password are percent-encoded. The result contains the password in
    /// clear text; log [`redacted_connection_string`](Self::redacted_connection_string)
    /// instead.
    /// `SQLite` has no authentication, so its form omits the credentials.
    #[must_use]
    pub fn connection_string(&self, credentials: &Credentials) -> String {
        match self {
            StoreTarget::Postgres(pg) => pg.render(
                &urlencoding::encode(credentials.user()),
                &urlencoding::encode(credentials.password()),
            ),
            StoreTarget::Sqlite(sqlite) => format!("sqlite://{}", sqlite.path.display()),
        }
    }

    #[must_use]
    pub fn redacted_connection_string(&self, credentials: &Credentials) -> String {
        match self {
            StoreTarget::Postgres(pg) => {
                pg.render(&urlencoding::encode(credentials.user()), REDACTED)
            }
            StoreTarget::Sqlite(_) => self.connection_string(credentials),
        }
    }

    /// Check required fields and that the backend was compiled in.
    ///
    /// # Errors
    /// Returns `AtmDataError::ConfigError` describing the first problem found.
    pub fn validate(&self) -> Result<(), AtmDataError> {
        if !self.database_type().is_enabled() {
            return Err(AtmDataError::ConfigError(format!(
                "{:?} support is not enabled in this build",
                self.database_type()
            )));
        }
        match self {
            StoreTarget::Postgres(pg) => {
                if pg.host.is_empty() {
                    return Err(AtmDataError::ConfigError("host is required".to_string()));
                }
                if pg.schema.is_empty() {
                    return Err(AtmDataError::ConfigError("schema is required".to_string()));
                }
                if pg.port == 0 {
                    return Err(AtmDataError::ConfigError("port is required".to_string()));
                }
            }
            StoreTarget::Sqlite(sqlite) => {
                if sqlite.path.as_os_str().is_empty() {
                    return Err(AtmDataError::ConfigError(
                        "db path is required".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl From<PostgresTarget> for StoreTarget {
    fn from(target: PostgresTarget) -> Self {
        StoreTarget::Postgres(target)
    }
}

impl From<SqliteTarget> for StoreTarget {
    fn from(target: SqliteTarget) -> Self {
        StoreTarget::Sqlite(target)
    }
}

/// Timeouts applied by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Upper bound on `connect()`, including statement preparation.
    pub connect_timeout: Duration,
    /// Upper bound on each CRUD statement execution.
    pub statement_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            statement_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_connection_string_template() {
        let target = StoreTarget::default();
        let creds = Credentials::new("teller", "s3cret");
        assert_eq!(
            target.connection_string(&creds),
            "postgresql://localhost:5432/atm?user=teller&password=s3cret&sslmode=disable"
        );
        assert_eq!(
            target.redacted_connection_string(&creds),
            "postgresql://localhost:5432/atm?user=teller&password=****&sslmode=disable"
        );
    }

    #[test]
    fn connection_string_encodes_credentials() {
        let target = StoreTarget::default();
        let creds = Credentials::new("night teller", "p&ss=word");
        assert_eq!(
            target.connection_string(&creds),
            concat!(
                "postgresql://localhost:5432/atm",
                "?user=night%20teller&password=p%26ss%3Dword&sslmode=disable"
            )
        );
        assert_eq!(
            target.redacted_connection_string(&creds),
            "postgresql://localhost:5432/atm?user=night%20teller&password=****&sslmode=disable"
        );
    }

    #[test]
    fn base_url_has_no_credentials() {
        let pg =
            PostgresTarget::new("db.internal", 6543, "bank").with_option("application_name", "atm");
        assert_eq!(
            pg.base_url(),
            "postgresql://db.internal:6543/bank?sslmode=disable&application_name=atm"
        );
    }

    #[test]
    fn credentials_debug_hides_password() {
        let rendered = format!("{:?}", Credentials::default());
        assert!(rendered.contains("root"));
        assert!(!rendered.contains("password: \"root\""));
        assert!(rendered.contains(REDACTED));
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let mut pg = PostgresTarget::default();
        pg.host.clear();
        let err = StoreTarget::Postgres(pg).validate();
        if DatabaseType::Postgres.is_enabled() {
            assert!(matches!(
                err,
                Err(AtmDataError::ConfigError(msg)) if msg == "host is required"
            ));
        } else {
            assert!(matches!(err, Err(AtmDataError::ConfigError(_))));
        }

        let sqlite = StoreTarget::Sqlite(SqliteTarget::new(""));
        assert!(matches!(sqlite.validate(), Err(AtmDataError::ConfigError(_))));
    }
}
