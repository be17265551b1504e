//! Entry-point handlers for the ingest and migrate binaries.

use anyhow::{Context, Result, bail};
use log::info;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::engine::Cli;
use crate::engine::db_ops::{RecordStore, Store};
use crate::pipeline::{HttpUpstream, RunControl, run_ingest};
use crate::types::{IngestSettings, Opts, RunSummary};
use crate::utils::{StorageConfig, load_dotenv, setup_logging};

/// Setup logging, load `.env`, and build Opts from the CLI and environment.
fn setup_operation(cli: &Cli) -> Result<Opts> {
    setup_logging(cli.verbose);
    load_dotenv();
    let storage = StorageConfig::from_env()?;
    Ok(Opts {
        verbose: cli.verbose,
        storage,
        ingest: IngestSettings::default(),
    })
}

/// Create the people table if missing.
pub async fn handle_migrate(cli: &Cli) -> Result<()> {
    let opts = setup_operation(cli)?;
    let mut store = Store::open(&opts.storage).await?;
    let created = store.init_schema().await;
    let rows = match created {
        Ok(()) => store.row_count().await,
        Err(e) => Err(e),
    };
    store.close().await?;
    info!("Tables created; swapi_people holds {} rows", rows?);
    Ok(())
}

/// Run the full ingest. The HTTP client and the store live exactly as long as this call; the
/// store is closed on every path out of the run.
pub async fn handle_ingest(cli: &Cli) -> Result<RunSummary> {
    let opts = setup_operation(cli)?;

    let cancel_requested = Arc::new(AtomicBool::new(false));
    let cancel_requested_handler = Arc::clone(&cancel_requested);
    ctrlc::set_handler(move || {
        cancel_requested_handler.store(true, Ordering::Relaxed);
    })
    .context("set Ctrl+C handler")?;

    let upstream = HttpUpstream::new()?;
    let mut store = Store::open(&opts.storage).await?;
    let control = RunControl {
        cancel: Some(Arc::clone(&cancel_requested)),
        show_progress: opts.verbose,
    };

    let ran = run_ingest(&upstream, &mut store, &opts.ingest, &control).await;
    let rows = if ran.is_ok() {
        store.row_count().await.ok()
    } else {
        None
    };
    let closed = store.close().await;
    drop(upstream);

    let summary = ran?;
    closed?;

    info!(
        "Done: {} ids in {} chunks, {} fetched, {} enriched, {} valid, {} inserted, {} skipped, {} failed batches",
        summary.total,
        summary.chunks,
        summary.fetched,
        summary.enriched,
        summary.valid,
        summary.inserted,
        summary.skipped,
        summary.failed_batches
    );
    if let Some(rows) = rows {
        info!("swapi_people now holds {} rows", rows);
    }
    if summary.cancelled {
        bail!(
            "Ingest cancelled by user; {} chunks were stored",
            summary.chunks
        );
    }
    Ok(summary)
}
