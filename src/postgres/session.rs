use std::fmt;
use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls, Statement};

use crate::config::{Credentials, PostgresTarget};
use crate::error::StoreError;
use crate::executor::StatementExecutor;
use crate::results::ResultSet;
use crate::statements::{QueryShape, StatementRegistry};
use crate::types::{DatabaseType, ParamConverter, RowValues};

use super::config::client_config;
use super::params::Params;
use super::query::{build_result_set, postgres_extract_value};

/// How long `close` waits for the driver's connection task to wind down.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

struct Live {
    client: Client,
    registry: StatementRegistry<Statement>,
    connection_task: JoinHandle<()>,
}

/// `PostgreSQL` client plus its prepared statements.
pub struct PostgresSession {
    host: String,
    statement_timeout: Duration,
    live: Option<Live>,
}

impl PostgresSession {
    /// Connect to `target` and prepare every query shape.
    ///
    /// `statement_timeout` is applied both on the server and around each call.
    ///
    /// # Errors
    /// Returns `StoreError` if authentication or the connection fails, or if any statement
    /// fails to prepare; in the latter case the connection is shut down before returning.
    pub async fn connect(
        target: &PostgresTarget,
        credentials: &Credentials,
        connect_timeout: Duration,
        statement_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let config = client_config(target, credentials, connect_timeout, statement_timeout)?;
        let (client, connection) = config.connect(NoTls).await?;
        let connection_task = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "postgres connection terminated");
            }
        });

        let prepared = {
            let client = &client;
            StatementRegistry::prepare_all(|shape| async move {
                let sql = shape.sql(DatabaseType::Postgres);
                Ok::<_, StoreError>(client.prepare(&sql).await?)
            })
            .await
        };

        match prepared {
            Ok(registry) => Ok(Self {
                host: target.host.clone(),
                statement_timeout,
                live: Some(Live {
                    client,
                    registry,
                    connection_task,
                }),
            }),
            Err(e) => {
                drop(client);
                shutdown(connection_task).await;
                Err(e)
            }
        }
    }

    fn live(&self) -> Result<&Live, StoreError> {
        self.live
            .as_ref()
            .ok_or_else(|| StoreError::ConnectionError("postgres session is closed".into()))
    }

    fn statement(
        &self,
        shape: QueryShape,
        params: &[RowValues],
    ) -> Result<(&Live, &Statement), StoreError> {
        let live = self.live()?;
        let stmt = live.registry.get(shape)?;
        shape.check_params(params)?;
        Ok((live, stmt))
    }

    /// Await `call`, cancelling it on the server once the statement timeout passes.
    ///
    /// After a cancel request the call is still awaited, so a statement that finished
    /// before the cancel arrived is reported with its real result. The server-side
    /// `statement_timeout` bounds that wait.
    async fn bounded<T>(
        &self,
        live: &Live,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        let limit = self.statement_timeout;
        let mut call = pin!(call);
        if let Ok(outcome) = tokio::time::timeout(limit, call.as_mut()).await {
            return outcome;
        }
        if let Err(e) = live.client.cancel_token().cancel_query(NoTls).await {
            tracing::warn!(error = %e, "postgres cancel request failed");
        }
        match call.await {
            Err(StoreError::PostgresError(e)) if e.code() == Some(&SqlState::QUERY_CANCELED) => {
                Err(StoreError::Timeout(limit))
            }
            outcome => outcome,
        }
    }
}

async fn shutdown(mut connection_task: JoinHandle<()>) {
    if tokio::time::timeout(SHUTDOWN_GRACE, &mut connection_task).await.is_err() {
        connection_task.abort();
    }
}

impl fmt::Debug for PostgresSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresSession")
            .field("host", &self.host)
            .field("statement_timeout", &self.statement_timeout)
            .field("open", &self.live.is_some())
            .finish()
    }
}

#[async_trait]
impl StatementExecutor for PostgresSession {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Postgres
    }

    fn prepared_count(&self) -> usize {
        self.live.as_ref().map_or(0, |live| live.registry.len())
    }

    async fn query(
        &self,
        shape: QueryShape,
        params: &[RowValues],
    ) -> Result<ResultSet, StoreError> {
        let (live, stmt) = self.statement(shape, params)?;
        let converted = <Params as ParamConverter>::convert_sql_params(params)?;
        self.bounded(live, build_result_set(stmt, converted.as_refs(), &live.client))
            .await
    }

    async fn execute(&self, shape: QueryShape, params: &[RowValues]) -> Result<usize, StoreError> {
        let (live, stmt) = self.statement(shape, params)?;
        let converted = <Params as ParamConverter>::convert_sql_params(params)?;
        let rows = self
            .bounded(live, async {
                Ok::<_, StoreError>(live.client.execute(stmt, converted.as_refs()).await?)
            })
            .await?;
        usize::try_from(rows)
            .map_err(|e| StoreError::ExecutionError(format!("Invalid rows affected count: {e}")))
    }

    async fn insert_returning_key(
        &self,
        shape: QueryShape,
        params: &[RowValues],
    ) -> Result<Option<i64>, StoreError> {
        let (live, stmt) = self.statement(shape, params)?;
        let converted = <Params as ParamConverter>::convert_sql_params(params)?;
        let rows = self
            .bounded(live, async {
                Ok::<_, StoreError>(live.client.query(stmt, converted.as_refs()).await?)
            })
            .await?;
        match rows.first() {
            Some(row) => Ok(postgres_extract_value(row, 0)?.as_int().copied()),
            None => Ok(None),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let live = self.live()?;
        self.bounded(live, async {
            Ok::<_, StoreError>(live.client.batch_execute("SELECT 1").await?)
        })
        .await
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        let Some(Live {
            client,
            registry,
            connection_task,
        }) = self.live.take()
        else {
            return Ok(());
        };
        drop(registry);
        drop(client);
        shutdown(connection_task).await;
        Ok(())
    }
}
