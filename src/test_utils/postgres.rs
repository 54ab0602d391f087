use postgresql_embedded::PostgreSQL;
use tokio_postgres::NoTls;

use super::SHARED_RUNTIME;
use crate::config::{Credentials, PostgresTarget};

/// Schema for the `user` and `account` tables.
pub const POSTGRES_SCHEMA: &str = include_str!("../../tests/sql/postgres_schema.sql");

/// A running embedded `PostgreSQL` server with the ATM schema applied.
///
/// The server stops when this value is dropped or passed to [`stop_postgres_embedded`].
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    pub target: PostgresTarget,
    pub credentials: Credentials,
}

/// Start an embedded server, create database `schema` and the ATM tables in it.
///
/// # Errors
/// Returns an error if the server cannot be set up or started, or if creating the
/// database or applying the schema fails.
pub fn setup_postgres_embedded(
    schema: &str,
) -> Result<EmbeddedPostgres, Box<dyn std::error::Error>> {
    SHARED_RUNTIME.block_on(async {
        let mut postgresql = PostgreSQL::default();
        postgresql.setup().await?;
        postgresql.start().await?;
        postgresql.create_database(schema).await?;

        let settings = postgresql.settings();
        let target = PostgresTarget::new(settings.host.clone(), settings.port, schema);
        let credentials = Credentials::new(settings.username.clone(), settings.password.clone());

        let (client, connection) = tokio_postgres::Config::new()
            .host(&target.host)
            .port(target.port)
            .dbname(schema)
            .user(credentials.user())
            .password(credentials.password())
            .connect(NoTls)
            .await?;
        let connection_task = tokio::spawn(connection);
        client.batch_execute(POSTGRES_SCHEMA).await?;
        drop(client);
        let _ = connection_task.await;

        println!("PostgreSQL started on port {}", target.port);

        Ok::<_, Box<dyn std::error::Error>>(EmbeddedPostgres {
            postgresql,
            target,
            credentials,
        })
    })
}

/// Stop a previously started embedded server.
pub fn stop_postgres_embedded(postgres: EmbeddedPostgres) {
    let EmbeddedPostgres { postgresql, .. } = postgres;
    SHARED_RUNTIME.block_on(async move {
        let _ = postgresql.stop().await;
    });
}
