//! Batch coordination between the walker, the worker pool and the store.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use log::info;
use tilepack_core::TilePathParser;

use crate::pool::{PoolBuildError, ReadFailurePolicy, TileWorkerPool};
use crate::store::TileSink;
use crate::ImportError;

/// Counters describing a finished import.
///
/// `files_seen` counts every regular file handed to a batch, including files
/// that were not tiles or could not be read. `tiles_written` counts rows
/// actually inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Files taken from the walk.
    pub files_seen: u64,
    /// Rows inserted into the tile table.
    pub tiles_written: u64,
    /// Matched tiles skipped because they could not be read.
    pub unreadable_skipped: u64,
    /// Committed batch transactions.
    pub batches: u64,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

/// Upper bound on the slots reserved up front for a batch's paths.
const PREALLOCATED_PATHS: usize = 4096;

/// Paths waiting to be decoded and committed together.
#[derive(Debug, Clone)]
pub struct TileBatch {
    paths: Vec<Utf8PathBuf>,
    capacity: NonZeroUsize,
}

impl TileBatch {
    /// An empty batch that fills after `capacity` paths.
    ///
    /// Storage grows on demand past the first few thousand paths, so very
    /// large capacities cost nothing until paths arrive.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            paths: Vec::with_capacity(capacity.get().min(PREALLOCATED_PATHS)),
            capacity,
        }
    }

    /// Append a path, returning `true` once the batch is full.
    pub fn push(&mut self, path: Utf8PathBuf) -> bool {
        self.paths.push(path);
        self.is_full()
    }

    /// Whether the batch has reached its capacity.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.paths.len() >= self.capacity.get()
    }

    /// Whether no paths are pending.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Number of pending paths.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.paths.len()
    }

    /// Pending paths in submission order.
    #[must_use]
    pub fn paths(&self) -> &[Utf8PathBuf] {
        &self.paths
    }

    /// Forget every pending path, keeping the allocation.
    pub fn clear(&mut self) {
        self.paths.clear();
    }
}

/// One import run: the worker pool, the parser and the batch being filled.
///
/// A session alternates between accumulating paths and flushing a full batch.
/// Flushing decodes the batch on the pool, writes the records through the
/// sink as a single transaction and only then resumes accumulation, so at
/// most one batch of tile bytes is in memory.
#[derive(Debug)]
pub struct ImportSession {
    pool: TileWorkerPool,
    parser: TilePathParser,
    batch: TileBatch,
    read_failures: ReadFailurePolicy,
    report: ImportReport,
}

impl ImportSession {
    /// Start the worker pool for a new session.
    pub fn new(
        workers: NonZeroUsize,
        batch_size: NonZeroUsize,
        parser: TilePathParser,
    ) -> Result<Self, PoolBuildError> {
        Ok(Self {
            pool: TileWorkerPool::new(workers)?,
            parser,
            batch: TileBatch::new(batch_size),
            read_failures: ReadFailurePolicy::default(),
            report: ImportReport::default(),
        })
    }

    /// Choose how unreadable tiles are handled.
    #[must_use]
    pub fn with_read_failures(mut self, policy: ReadFailurePolicy) -> Self {
        self.read_failures = policy;
        self
    }

    /// Feed every file into batches and commit them through `sink`.
    ///
    /// A trailing partial batch is committed after the files run out; an
    /// empty trailing batch is not. The first error stops the run, leaving
    /// earlier batches committed.
    pub fn run<I, S>(mut self, files: I, sink: &mut S) -> Result<ImportReport, ImportError>
    where
        I: IntoIterator<Item = Utf8PathBuf>,
        S: TileSink + ?Sized,
    {
        let started = Instant::now();
        for path in files {
            if self.batch.push(path) {
                self.flush(sink)?;
            }
        }
        if !self.batch.is_empty() {
            self.flush(sink)?;
        }
        self.report.elapsed = started.elapsed();
        Ok(self.report)
    }

    fn flush<S>(&mut self, sink: &mut S) -> Result<(), ImportError>
    where
        S: TileSink + ?Sized,
    {
        let decoded =
            self.pool
                .decode_batch(&self.parser, self.batch.paths(), self.read_failures)?;
        sink.write_batch(&decoded.records)?;

        self.report.batches += 1;
        self.report.files_seen += widen(self.batch.len());
        self.report.tiles_written += widen(decoded.records.len());
        self.report.unreadable_skipped += widen(decoded.unreadable);
        info!(
            "committed batch {}: {} files seen, {} tiles written",
            self.report.batches, self.report.files_seen, self.report.tiles_written
        );
        self.batch.clear();
        Ok(())
    }
}

fn widen(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}
