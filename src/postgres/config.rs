use std::time::Duration;

use tokio_postgres::Config as PgConfig;

use crate::config::{Credentials, PostgresTarget};
use crate::error::StoreError;

/// Build the client configuration for `target`.
///
/// The target's credential-free URL is parsed and the credentials are applied through
/// the builder, so passwords never need URL escaping. `statement_timeout` is set as the
/// server-side `statement_timeout` for the session.
///
/// # Errors
/// Returns `StoreError::ConnectionError` if the rendered URL does not parse.
pub fn client_config(
    target: &PostgresTarget,
    credentials: &Credentials,
    connect_timeout: Duration,
    statement_timeout: Duration,
) -> Result<PgConfig, StoreError> {
    let mut config: PgConfig = target.base_url().parse().map_err(|e| {
        StoreError::ConnectionError(format!("invalid postgres connection string: {e}"))
    })?;
    config
        .user(credentials.user())
        .password(credentials.password())
        .connect_timeout(connect_timeout)
        .application_name("atm-data")
        .options(&format!("-c statement_timeout={}", statement_timeout.as_millis()));
    Ok(config)
}
