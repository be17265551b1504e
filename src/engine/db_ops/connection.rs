//! Open the SQLite people database and read it back.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::path::Path;

use crate::types::{BatchOutcome, FlattenedRecord};

use super::{COUNT_SQL, RecordStore, SQLITE_SCHEMA, WAL_PRAGMAS};

/// [`RecordStore`] over one rusqlite connection held for the whole run.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the database file with WAL enabled. Does not create the table.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("open database {}", path.display()))?;
        conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
            .context("enable WAL")?;
        conn.execute_batch(WAL_PRAGMAS).context("set WAL pragmas")?;
        Ok(Self { conn })
    }

    /// In-memory database (tests and dry runs; no WAL pragmas needed).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        Ok(Self { conn })
    }

    /// Underlying connection, for pragmas and checks the store does not wrap.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create the people table (idempotent).
    pub fn apply_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(SQLITE_SCHEMA)
            .context("create schema")?;
        Ok(())
    }

    pub fn count_rows(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row(COUNT_SQL, [], |row| row.get(0))
            .context("count rows")?;
        Ok(n.max(0) as u64)
    }

    /// Load every stored row keyed by id.
    pub fn load_records(&self) -> Result<BTreeMap<i64, FlattenedRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, birth_year, eye_color, films, gender, hair_color, homeworld, mass, name, \
             skin_color, species, starships, vehicles FROM swapi_people ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            let text = |i: usize| -> rusqlite::Result<String> {
                Ok(row.get::<_, Option<String>>(i)?.unwrap_or_default())
            };
            Ok((
                id,
                FlattenedRecord {
                    id: Some(id.to_string()),
                    birth_year: row.get(1)?,
                    eye_color: row.get(2)?,
                    films: text(3)?,
                    gender: row.get(4)?,
                    hair_color: row.get(5)?,
                    homeworld: text(6)?,
                    mass: row.get(7)?,
                    name: row.get(8)?,
                    skin_color: row.get(9)?,
                    species: text(10)?,
                    starships: text(11)?,
                    vehicles: text(12)?,
                },
            ))
        })?;
        let mut map = BTreeMap::new();
        for row in rows {
            let (id, record) = row?;
            map.insert(id, record);
        }
        Ok(map)
    }
}

impl RecordStore for SqliteStore {
    async fn init_schema(&mut self) -> Result<()> {
        self.apply_schema()
    }

    async fn insert_batch(&mut self, records: &[FlattenedRecord]) -> Result<BatchOutcome> {
        super::writer::write_batch(&mut self.conn, records)
    }

    async fn row_count(&mut self) -> Result<u64> {
        self.count_rows()
    }

    async fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| e)
            .context("close database")
    }
}
