//! Batch insert into SQLite: one transaction per batch, bad rows skipped.

use anyhow::{Context, Result};
use log::{error, warn};
use rusqlite::{Connection, Statement};

use crate::types::{BatchOutcome, FlattenedRecord};

use super::{PeopleRow, SQLITE_INSERT_SQL};

/// Execute one insert for a built row.
fn execute_insert_row(stmt: &mut Statement<'_>, row: &PeopleRow<'_>) -> rusqlite::Result<()> {
    stmt.execute((
        row.id,
        row.birth_year,
        row.eye_color,
        row.films,
        row.gender,
        row.hair_color,
        row.homeworld,
        row.mass,
        row.name,
        row.skin_color,
        row.species,
        row.starships,
        row.vehicles,
    ))?;
    Ok(())
}

/// Insert `records` in a single transaction. Rows that fail to build or insert (e.g. duplicate id)
/// are logged and skipped; the transaction carries on. A failed commit rolls everything back.
pub(crate) fn write_batch(conn: &mut Connection, records: &[FlattenedRecord]) -> Result<BatchOutcome> {
    if records.is_empty() {
        return Ok(BatchOutcome {
            committed: true,
            ..Default::default()
        });
    }

    let tx = conn.transaction().context("begin transaction")?;
    let mut outcome = BatchOutcome::default();
    {
        let mut stmt = tx.prepare(SQLITE_INSERT_SQL).context("prepare insert")?;
        for record in records {
            let row = match PeopleRow::try_from(record) {
                Ok(row) => row,
                Err(e) => {
                    warn!("Skipping record {:?}: {:#}", record.id, e);
                    outcome.skipped += 1;
                    continue;
                }
            };
            match execute_insert_row(&mut stmt, &row) {
                Ok(()) => outcome.inserted += 1,
                Err(e) => {
                    warn!("Skipping record {}: {}", row.id, e);
                    outcome.skipped += 1;
                }
            }
        }
    }

    // Dropping a transaction whose COMMIT failed rolls it back.
    match tx.commit() {
        Ok(()) => outcome.committed = true,
        Err(e) => {
            error!(
                "Commit failed, {} records rolled back: {}",
                outcome.inserted, e
            );
            outcome.skipped += outcome.inserted;
            outcome.inserted = 0;
        }
    }
    Ok(outcome)
}
