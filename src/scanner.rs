use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future;
use indicatif::MultiProgress;
use log::{debug, info};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{self, JoinError};

use crate::classifier::contains_hex_letter;
use crate::progress_reporter::ProgressReporter;
use crate::shared_types::{ChunkRange, ValueCount};

/// Values scanned between progress updates. Large enough that the hot loop
/// is dominated by classification, small enough that the bar still moves.
const PROGRESS_BATCH: u64 = 1 << 16;

/// Exclusive upper bound of what the 4-byte big-endian encoding can hold.
const ENCODING_LIMIT: i64 = 1 << 32;

#[derive(Error, Debug)]
pub(crate) enum ScanError {
    #[error("chunk count must be at least 1")]
    InvalidChunkCount,
    #[error("end {end} precedes start {start}")]
    NegativeSpan { start: i64, end: i64 },
    #[error("{0} does not fit the 4-byte encoding (accepted domain is 0..=2^32)")]
    ValueOutOfRange(i64),
    #[error("scan worker {id} failed: {source}")]
    WorkerPanicked {
        id: usize,
        #[source]
        source: JoinError,
    },
}

/// How chunk upper bounds are derived from the truncating `span / chunks`
/// division.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum PartitionPolicy {
    /// The last chunk absorbs `span % chunks`; every value is scanned once.
    #[default]
    Full,
    /// Each chunk stops one value early and the tail remainder is skipped.
    /// Reproduces the partitioning of earlier versions of this tool so totals
    /// stay comparable with old measurement runs.
    DropRemainder,
}

pub(crate) struct ScanPreferences {
    pub(crate) start: i64,
    pub(crate) end: i64,
    pub(crate) chunk_count: usize,
    pub(crate) debug: bool,
    pub(crate) partition: PartitionPolicy,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct ScanOutcome {
    /// Values whose hex encoding contains no letter.
    pub(crate) total: u64,
    /// Width of the requested range, `end - start`.
    pub(crate) span: u64,
}

struct ChunkTally {
    numeric: u64,
    passes: u64,
}

pub(crate) async fn start_scan(
    prefs: ScanPreferences,
    multi: MultiProgress,
) -> Result<ScanOutcome, ScanError> {
    let (begin, end) = validate(&prefs)?;
    let span = end - begin;
    let chunks = chunk_bounds(begin, end, prefs.chunk_count, prefs.partition);

    info!(
        "Dividing {span} ({begin}–{end}) timestamps into {} chunks of size {}",
        chunks.len(),
        span / prefs.chunk_count as u64
    );

    let count = Arc::new(AtomicU64::new(0));
    let (s_progress, r_progress) = mpsc::channel::<ValueCount>(prefs.chunk_count);
    let reporter = ProgressReporter::new(r_progress, span, multi).spawn();

    let mut handles = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.into_iter().enumerate() {
        info!(
            "Spawning scan worker {i} for [{}, {}) (chunk size {})",
            chunk.start,
            chunk.stop,
            chunk.stop - chunk.start
        );
        let count = Arc::clone(&count);
        let s_progress = s_progress.clone();
        let debug = prefs.debug;
        handles.push(task::spawn_blocking(move || {
            scan_chunk(i, chunk, debug, &count, &s_progress)
        }));
    }
    drop(s_progress);

    let mut numeric_sum: u64 = 0;
    let mut passes_sum: u64 = 0;
    for (id, joined) in future::join_all(handles).await.into_iter().enumerate() {
        let tally = joined.map_err(|source| ScanError::WorkerPanicked { id, source })?;
        numeric_sum += tally.numeric;
        passes_sum += tally.passes;
    }
    reporter.await.ok();
    debug!("Workers examined {passes_sum} values, {numeric_sum} numeric");

    // The join above is the barrier: no worker is still adding.
    let total = count.load(Ordering::Relaxed);
    Ok(ScanOutcome { total, span })
}

fn validate(prefs: &ScanPreferences) -> Result<(u64, u64), ScanError> {
    if prefs.chunk_count == 0 {
        return Err(ScanError::InvalidChunkCount);
    }
    if prefs.end < prefs.start {
        return Err(ScanError::NegativeSpan {
            start: prefs.start,
            end: prefs.end,
        });
    }
    if prefs.start < 0 || prefs.start > ENCODING_LIMIT {
        return Err(ScanError::ValueOutOfRange(prefs.start));
    }
    if prefs.end > ENCODING_LIMIT {
        return Err(ScanError::ValueOutOfRange(prefs.end));
    }
    Ok((prefs.start as u64, prefs.end as u64))
}

/// Split `[begin, end)` into `chunk_count` contiguous half-open sub-ranges.
fn chunk_bounds(
    begin: u64,
    end: u64,
    chunk_count: usize,
    policy: PartitionPolicy,
) -> Vec<ChunkRange> {
    let span = end - begin;
    let chunk_size = span / chunk_count as u64;
    (0..chunk_count as u64)
        .map(|i| {
            let start = begin + i * chunk_size;
            let stop = match policy {
                PartitionPolicy::Full if i == chunk_count as u64 - 1 => end,
                PartitionPolicy::Full => start + chunk_size,
                PartitionPolicy::DropRemainder => start + chunk_size.saturating_sub(1),
            };
            ChunkRange { start, stop }
        })
        .collect()
}

fn scan_chunk(
    id: usize,
    chunk: ChunkRange,
    debug: bool,
    count: &AtomicU64,
    s_progress: &mpsc::Sender<ValueCount>,
) -> ChunkTally {
    let mut numeric: u64 = 0;
    let mut passes: u64 = 0;
    let mut unreported: u64 = 0;

    for timestamp in chunk.start..chunk.stop {
        let encoded = (timestamp as u32).to_be_bytes();

        if !contains_hex_letter(&encoded) {
            numeric += 1;
            if debug {
                debug!("{timestamp:08x} {timestamp} {timestamp:032b}");
            }
        }
        passes += 1;

        unreported += 1;
        if unreported == PROGRESS_BATCH {
            // Lossy on purpose: a full channel only costs bar smoothness.
            s_progress.try_send(unreported).ok();
            unreported = 0;
        }
    }
    if unreported > 0 {
        s_progress.try_send(unreported).ok();
    }

    let local_ratio = if passes > 0 {
        numeric as f64 / passes as f64
    } else {
        0.0
    };
    info!(
        "Worker {id} reached the end ({}). Found numeric hexes in {numeric}/{passes} ({local_ratio}) passes.",
        chunk.stop
    );

    count.fetch_add(numeric, Ordering::Relaxed);

    ChunkTally { numeric, passes }
}
