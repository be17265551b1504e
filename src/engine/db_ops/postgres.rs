//! PostgreSQL backend: one client for the run, one transaction per batch, a savepoint per row.

use anyhow::{Context, Result};
use log::{error, warn};
use std::future::Future;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, Config as PgConfig, NoTls};

use crate::types::{BatchOutcome, FlattenedRecord};
use crate::utils::PgSettings;

use super::{COUNT_SQL, PG_INSERT_SQL, PG_SCHEMA, PeopleRow, RecordStore};

/// [`RecordStore`] over a single `tokio_postgres::Client`.
pub struct PgStore {
    client: Client,
    connection: JoinHandle<()>,
}

impl PgStore {
    /// Connect and drive the connection on a background task until the client is dropped.
    pub async fn connect(settings: &PgSettings) -> Result<Self> {
        let mut pg = PgConfig::new();
        pg.host(&settings.host);
        pg.port(settings.port);
        pg.user(&settings.user);
        if !settings.password.is_empty() {
            pg.password(&settings.password);
        }
        pg.dbname(&settings.database);

        let (client, connection) = pg.connect(NoTls).await.with_context(|| {
            format!(
                "connect to PostgreSQL at {}:{}/{}",
                settings.host, settings.port, settings.database
            )
        })?;
        let connection = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {}", e);
            }
        });
        Ok(Self { client, connection })
    }
}

/// Statements the batch writer issues. [`Client`] in production.
pub(crate) trait PgSession {
    /// Run one or more statements that return no rows.
    fn execute_sql(&self, sql: &str) -> impl Future<Output = Result<()>>;

    fn insert_row(&self, row: &PeopleRow<'_>) -> impl Future<Output = Result<()>>;
}

impl PgSession for Client {
    async fn execute_sql(&self, sql: &str) -> Result<()> {
        self.batch_execute(sql).await?;
        Ok(())
    }

    async fn insert_row(&self, row: &PeopleRow<'_>) -> Result<()> {
        self.execute(
            PG_INSERT_SQL,
            &[
                &row.id,
                &row.birth_year,
                &row.eye_color,
                &row.films,
                &row.gender,
                &row.hair_color,
                &row.homeworld,
                &row.mass,
                &row.name,
                &row.skin_color,
                &row.species,
                &row.starships,
                &row.vehicles,
            ],
        )
        .await?;
        Ok(())
    }
}

/// Insert one row inside its own savepoint so a failed insert leaves the batch transaction usable.
///
/// The outer `Err` is a savepoint failure: the transaction is no longer trustworthy. The inner
/// `Err` is the insert failure of this row alone.
async fn insert_row_guarded<S: PgSession>(session: &S, row: &PeopleRow<'_>) -> Result<Result<()>> {
    session
        .execute_sql("SAVEPOINT swapi_row")
        .await
        .context("create savepoint")?;
    match session.insert_row(row).await {
        Ok(()) => {
            session
                .execute_sql("RELEASE SAVEPOINT swapi_row")
                .await
                .context("release savepoint")?;
            Ok(Ok(()))
        }
        Err(e) => {
            session
                .execute_sql("ROLLBACK TO SAVEPOINT swapi_row; RELEASE SAVEPOINT swapi_row")
                .await
                .context("roll back to savepoint")?;
            Ok(Err(e))
        }
    }
}

/// Write `records` as one transaction. Rows that fail to build or insert are skipped; a failed
/// commit rolls the batch back and reports `committed = false`. A savepoint failure aborts the
/// transaction and is returned as `Err`.
pub(crate) async fn write_pg_batch<S: PgSession>(
    session: &S,
    records: &[FlattenedRecord],
) -> Result<BatchOutcome> {
    if records.is_empty() {
        return Ok(BatchOutcome {
            committed: true,
            ..Default::default()
        });
    }

    session
        .execute_sql("BEGIN")
        .await
        .context("begin transaction")?;
    let mut outcome = BatchOutcome::default();
    for record in records {
        let row = match PeopleRow::try_from(record) {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping record {:?}: {:#}", record.id, e);
                outcome.skipped += 1;
                continue;
            }
        };
        match insert_row_guarded(session, &row).await {
            Ok(Ok(())) => outcome.inserted += 1,
            Ok(Err(e)) => {
                warn!("Skipping record {}: {:#}", row.id, e);
                outcome.skipped += 1;
            }
            Err(e) => {
                if let Err(rb) = session.execute_sql("ROLLBACK").await {
                    warn!("Rollback after savepoint failure: {:#}", rb);
                }
                return Err(e.context(format!("batch aborted at record {}", row.id)));
            }
        }
    }

    match session.execute_sql("COMMIT").await {
        Ok(()) => outcome.committed = true,
        Err(e) => {
            let _ = session.execute_sql("ROLLBACK").await;
            error!(
                "Commit failed, {} records rolled back: {:#}",
                outcome.inserted, e
            );
            outcome.skipped += outcome.inserted;
            outcome.inserted = 0;
        }
    }
    Ok(outcome)
}

impl RecordStore for PgStore {
    async fn init_schema(&mut self) -> Result<()> {
        self.client
            .batch_execute(PG_SCHEMA)
            .await
            .context("create schema")
    }

    async fn insert_batch(&mut self, records: &[FlattenedRecord]) -> Result<BatchOutcome> {
        write_pg_batch(&self.client, records).await
    }

    async fn row_count(&mut self) -> Result<u64> {
        let row = self
            .client
            .query_one(COUNT_SQL, &[])
            .await
            .context("count rows")?;
        let n: i64 = row.get(0);
        Ok(n.max(0) as u64)
    }

    async fn close(self) -> Result<()> {
        drop(self.client);
        self.connection
            .await
            .context("PostgreSQL connection task panicked")
    }
}
