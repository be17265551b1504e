//! Run driver: split the id space into chunks and push each one through fetch, enrich and store.

use anyhow::Result;
use futures::future::join_all;
use log::{debug, info, warn};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::engine::db_ops::RecordStore;
use crate::engine::progress::{
    ProgressBarConfig, create_progress_bar, finish_progress_bar, update_progress_bar,
};
use crate::types::{FlattenedRecord, IngestSettings, RunSummary};

use super::enricher::enrich;
use super::fetcher::{fetch_chunk, fetch_total_count};
use super::upstream::Upstream;

/// Out-of-band controls for a run: Ctrl+C flag and progress display.
#[derive(Clone, Debug, Default)]
pub struct RunControl {
    /// Checked between chunks; when set, the run stops after the chunk in flight is stored.
    pub cancel: Option<Arc<AtomicBool>>,
    pub show_progress: bool,
}

impl RunControl {
    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }
}

/// Lazily split ids `1..=total` into consecutive ranges of `chunk_size` (the last may be shorter).
/// Nothing is allocated per id; a chunk's ids only materialize when it is processed.
pub fn chunk_ranges(total: u64, chunk_size: usize) -> impl Iterator<Item = RangeInclusive<u64>> {
    let size = u64::try_from(chunk_size.max(1)).unwrap_or(u64::MAX);
    (1..=total)
        .step_by(chunk_size.max(1))
        .map(move |start| start..=start.saturating_add(size - 1).min(total))
}

/// Number of ranges [`chunk_ranges`] yields.
pub fn chunk_count(total: u64, chunk_size: usize) -> u64 {
    let size = u64::try_from(chunk_size.max(1)).unwrap_or(u64::MAX);
    total.div_ceil(size)
}

/// Per-chunk counters folded into the run summary.
struct ChunkReport {
    fetched: usize,
    enriched: usize,
    valid: usize,
    inserted: usize,
    skipped: usize,
    failed_batch: bool,
}

/// Fetch, enrich, filter and store one chunk. Only storage failures escape as `Err`.
async fn process_chunk<U, S>(
    upstream: &U,
    store: &mut S,
    settings: &IngestSettings,
    ids: &[u64],
) -> Result<ChunkReport>
where
    U: Upstream,
    S: RecordStore,
{
    let raw = fetch_chunk(upstream, &settings.base_url, ids).await;
    let fetched: Vec<_> = raw.into_iter().flatten().collect();

    let enriched: Vec<FlattenedRecord> =
        join_all(fetched.iter().map(|entity| enrich(upstream, entity)))
            .await
            .into_iter()
            .flatten()
            .collect();
    let enriched_count = enriched.len();
    let valid: Vec<FlattenedRecord> = enriched
        .into_iter()
        .filter(|record| {
            if !record.has_id() {
                warn!("Dropping {:?}: no id", record.name);
            }
            record.has_id()
        })
        .collect();

    let mut report = ChunkReport {
        fetched: fetched.len(),
        enriched: enriched_count,
        valid: valid.len(),
        inserted: 0,
        skipped: 0,
        failed_batch: false,
    };
    if valid.is_empty() {
        info!("No valid records in chunk");
        return Ok(report);
    }

    let outcome = store.insert_batch(&valid).await?;
    report.inserted = outcome.inserted;
    report.skipped = outcome.skipped;
    report.failed_batch = !outcome.committed;
    if outcome.committed {
        info!("Inserted {} records", outcome.inserted);
    }
    if outcome.skipped > 0 {
        warn!("{} records in chunk were not stored", outcome.skipped);
    }
    Ok(report)
}

/// Run the whole ingest against `upstream` into `store`.
///
/// Creates the schema, reads the collection size (falling back to `settings.fallback_total`), then
/// processes chunks strictly one after another: all ids of a chunk are fetched concurrently,
/// every fetched entity is enriched concurrently, and the valid records go to storage as one batch.
/// Per-item failures are absorbed along the way; only storage errors abort the run.
pub async fn run_ingest<U, S>(
    upstream: &U,
    store: &mut S,
    settings: &IngestSettings,
    control: &RunControl,
) -> Result<RunSummary>
where
    U: Upstream,
    S: RecordStore,
{
    store.init_schema().await?;

    let total = fetch_total_count(upstream, &settings.base_url, settings.fallback_total).await;
    info!("Total people in API: {}", total);
    let chunk_total = chunk_count(total, settings.chunk_size);
    debug!(
        "{} chunks of up to {} ids",
        chunk_total, settings.chunk_size
    );

    let mut bar = control.show_progress.then(|| {
        create_progress_bar(ProgressBarConfig::chunks(
            usize::try_from(chunk_total).unwrap_or(usize::MAX),
        ))
    });
    let mut summary = RunSummary {
        total,
        ..Default::default()
    };

    for (n, range) in chunk_ranges(total, settings.chunk_size).enumerate() {
        if control.cancelled() {
            summary.cancelled = true;
            break;
        }
        info!(
            "Processing chunk {}: ids {}-{}",
            n + 1,
            range.start(),
            range.end()
        );

        let ids: Vec<u64> = range.collect();
        let report = process_chunk(upstream, store, settings, &ids).await?;
        summary.chunks += 1;
        summary.fetched += report.fetched;
        summary.enriched += report.enriched;
        summary.valid += report.valid;
        summary.inserted += report.inserted;
        summary.skipped += report.skipped;
        if report.failed_batch {
            summary.failed_batches += 1;
        }
        update_progress_bar(bar.as_mut(), 1);
    }

    finish_progress_bar(bar);
    Ok(summary)
}
