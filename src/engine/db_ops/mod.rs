//! Storage: schema, row mapping, and the SQLite / PostgreSQL backends behind [`RecordStore`].

mod connection;
mod postgres;
mod writer;

pub use connection::SqliteStore;
pub use postgres::PgStore;

use anyhow::{Context, Result, bail};
use log::info;
use std::future::Future;

use crate::types::{BatchOutcome, FlattenedRecord};
use crate::utils::StorageConfig;

/// WAL tuning pragmas (synchronous, autocheckpoint, size limit). Use after PRAGMA journal_mode = WAL.
pub(crate) const WAL_PRAGMAS: &str = r#"
        PRAGMA synchronous = NORMAL;
        PRAGMA wal_autocheckpoint = 10000;
        PRAGMA journal_size_limit = 67108864;
        "#;

/// People table, SQLite dialect.
pub(crate) const SQLITE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS swapi_people (
    id INTEGER PRIMARY KEY,
    birth_year TEXT,
    eye_color TEXT,
    films TEXT,
    gender TEXT,
    hair_color TEXT,
    homeworld TEXT,
    mass TEXT,
    name TEXT,
    skin_color TEXT,
    species TEXT,
    starships TEXT,
    vehicles TEXT
);
"#;

/// People table, PostgreSQL dialect. Widths match [`ColumnWidths`].
pub(crate) const PG_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS swapi_people (
    id BIGINT PRIMARY KEY,
    birth_year VARCHAR(50),
    eye_color VARCHAR(50),
    films TEXT,
    gender VARCHAR(50),
    hair_color VARCHAR(50),
    homeworld VARCHAR(255),
    mass VARCHAR(50),
    name VARCHAR(100),
    skin_color VARCHAR(50),
    species TEXT,
    starships TEXT,
    vehicles TEXT
);
"#;

pub(crate) const SQLITE_INSERT_SQL: &str = "INSERT INTO swapi_people \
    (id, birth_year, eye_color, films, gender, hair_color, homeworld, mass, name, skin_color, species, starships, vehicles) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)";

pub(crate) const PG_INSERT_SQL: &str = "INSERT INTO swapi_people \
    (id, birth_year, eye_color, films, gender, hair_color, homeworld, mass, name, skin_color, species, starships, vehicles) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)";

pub(crate) const COUNT_SQL: &str = "SELECT COUNT(*) FROM swapi_people";

/// Maximum character widths of the bounded text columns.
pub struct ColumnWidths;

impl ColumnWidths {
    pub const SHORT: usize = 50;
    pub const NAME: usize = 100;
    pub const HOMEWORLD: usize = 255;
}

/// One storage row, borrowed from a [`FlattenedRecord`]. Column order matches the insert statements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeopleRow<'a> {
    pub id: i64,
    pub birth_year: Option<&'a str>,
    pub eye_color: Option<&'a str>,
    pub films: &'a str,
    pub gender: Option<&'a str>,
    pub hair_color: Option<&'a str>,
    pub homeworld: &'a str,
    pub mass: Option<&'a str>,
    pub name: Option<&'a str>,
    pub skin_color: Option<&'a str>,
    pub species: &'a str,
    pub starships: &'a str,
    pub vehicles: &'a str,
}

fn bounded<'a>(column: &str, value: &'a str, max: usize) -> Result<&'a str> {
    let len = value.chars().count();
    if len > max {
        bail!("{column} is {len} characters, column holds {max}");
    }
    Ok(value)
}

fn bounded_opt<'a>(column: &str, value: Option<&'a str>, max: usize) -> Result<Option<&'a str>> {
    value.map(|v| bounded(column, v, max)).transpose()
}

impl<'a> TryFrom<&'a FlattenedRecord> for PeopleRow<'a> {
    type Error = anyhow::Error;

    fn try_from(r: &'a FlattenedRecord) -> Result<Self> {
        let raw_id = r.id.as_deref().context("record has no id")?;
        let id = raw_id
            .trim()
            .parse::<i64>()
            .with_context(|| format!("id {raw_id:?} is not an integer"))?;
        Ok(Self {
            id,
            birth_year: bounded_opt("birth_year", r.birth_year.as_deref(), ColumnWidths::SHORT)?,
            eye_color: bounded_opt("eye_color", r.eye_color.as_deref(), ColumnWidths::SHORT)?,
            films: &r.films,
            gender: bounded_opt("gender", r.gender.as_deref(), ColumnWidths::SHORT)?,
            hair_color: bounded_opt("hair_color", r.hair_color.as_deref(), ColumnWidths::SHORT)?,
            homeworld: bounded("homeworld", &r.homeworld, ColumnWidths::HOMEWORLD)?,
            mass: bounded_opt("mass", r.mass.as_deref(), ColumnWidths::SHORT)?,
            name: bounded_opt("name", r.name.as_deref(), ColumnWidths::NAME)?,
            skin_color: bounded_opt("skin_color", r.skin_color.as_deref(), ColumnWidths::SHORT)?,
            species: &r.species,
            starships: &r.starships,
            vehicles: &r.vehicles,
        })
    }
}

/// Persistence sink for flattened records.
///
/// `insert_batch` writes one transaction per call: rows that cannot be built or inserted are
/// logged and skipped, a failed commit rolls the whole batch back. Neither case is an `Err`;
/// `Err` means the store itself is unusable.
pub trait RecordStore {
    /// Create the people table if it does not exist.
    fn init_schema(&mut self) -> impl Future<Output = Result<()>>;

    fn insert_batch(
        &mut self,
        records: &[FlattenedRecord],
    ) -> impl Future<Output = Result<BatchOutcome>>;

    fn row_count(&mut self) -> impl Future<Output = Result<u64>>;

    /// Release the connection.
    fn close(self) -> impl Future<Output = Result<()>>
    where
        Self: Sized;
}

/// Backend chosen at startup from [`StorageConfig`].
pub enum Store {
    Sqlite(SqliteStore),
    Postgres(PgStore),
}

impl Store {
    pub async fn open(config: &StorageConfig) -> Result<Self> {
        match config {
            StorageConfig::Sqlite { path } => {
                info!("Opening SQLite database {}", path.display());
                Ok(Store::Sqlite(SqliteStore::open(path)?))
            }
            StorageConfig::Postgres(settings) => {
                info!(
                    "Connecting to PostgreSQL {}:{}/{}",
                    settings.host, settings.port, settings.database
                );
                Ok(Store::Postgres(PgStore::connect(settings).await?))
            }
        }
    }
}

impl RecordStore for Store {
    async fn init_schema(&mut self) -> Result<()> {
        match self {
            Store::Sqlite(s) => s.init_schema().await,
            Store::Postgres(s) => s.init_schema().await,
        }
    }

    async fn insert_batch(&mut self, records: &[FlattenedRecord]) -> Result<BatchOutcome> {
        match self {
            Store::Sqlite(s) => s.insert_batch(records).await,
            Store::Postgres(s) => s.insert_batch(records).await,
        }
    }

    async fn row_count(&mut self) -> Result<u64> {
        match self {
            Store::Sqlite(s) => s.row_count().await,
            Store::Postgres(s) => s.row_count().await,
        }
    }

    async fn close(self) -> Result<()> {
        match self {
            Store::Sqlite(s) => s.close().await,
            Store::Postgres(s) => s.close().await,
        }
    }
}
