//! Tile ingestion for tilepack.
//!
//! Responsibilities:
//! - Coordinate the walk of a tile cache with batched, parallel decoding.
//! - Persist each batch to SQLite inside a single transaction.
//! - Build the coordinate index once every batch is committed.
//!
//! Boundaries:
//! - Path and table rules live in `tilepack-core`.
//! - Filesystem access goes through `tilepack-fs`.
//!
//! Invariants:
//! - Only the coordinating thread touches the database connection.
//! - No global mutable state; every run owns its session and store.
#![forbid(unsafe_code)]

use std::num::NonZeroUsize;
use std::time::Instant;

use camino::Utf8PathBuf;
use log::info;
use thiserror::Error;
use tilepack_core::{DEFAULT_TILE_EXTENSION, TableName, TilePathParser};
use tilepack_fs::TreeWalker;

mod pool;
mod session;
mod store;

pub use pool::{
    DecodedBatch, PoolBuildError, ReadFailurePolicy, TileReadError, TileWorkerPool, decode_tile,
};
pub use session::{ImportReport, ImportSession, TileBatch};
pub use store::{TileSink, TileStore, TileStoreError, TileTransaction};

/// Files per batch for each worker when no batch size is configured.
pub const FILES_PER_WORKER: usize = 256;

/// Errors returned by an import run.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The worker pool could not be started.
    #[error(transparent)]
    Pool(#[from] PoolBuildError),
    /// A tile could not be read.
    #[error(transparent)]
    Read(#[from] TileReadError),
    /// Preparing or writing the database failed.
    #[error(transparent)]
    Store(#[from] TileStoreError),
}

/// Number of workers used when none is configured: the available parallelism.
#[must_use]
pub fn default_workers() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

/// Batch size used when none is configured: [`FILES_PER_WORKER`] per worker.
#[must_use]
pub fn default_batch_size(workers: NonZeroUsize) -> NonZeroUsize {
    NonZeroUsize::new(workers.get().saturating_mul(FILES_PER_WORKER)).unwrap_or(workers)
}

/// Everything an import run needs to know.
///
/// # Examples
/// ```
/// use std::num::NonZeroUsize;
/// use camino::Utf8PathBuf;
/// use tilepack_core::TableName;
/// use tilepack_data::ImportOptions;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let workers = NonZeroUsize::new(2).ok_or("zero workers")?;
/// let options = ImportOptions::new(
///     Utf8PathBuf::from("/srv/tiles"),
///     Utf8PathBuf::from("tiles.db"),
///     TableName::new("tiles")?,
/// )
/// .with_workers(workers);
/// assert_eq!(options.batch_size.get(), 512);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Root of the tile cache.
    pub source: Utf8PathBuf,
    /// SQLite file to create; an existing file is replaced.
    pub destination: Utf8PathBuf,
    /// Table receiving the tiles.
    pub table: TableName,
    /// Worker threads decoding tiles.
    pub workers: NonZeroUsize,
    /// Files per committed batch.
    pub batch_size: NonZeroUsize,
    /// Recognised tile extension.
    pub extension: String,
    /// Reaction to tiles that cannot be read.
    pub read_failures: ReadFailurePolicy,
}

impl ImportOptions {
    /// Options with default workers, batch size, extension and failure policy.
    #[must_use]
    pub fn new(source: Utf8PathBuf, destination: Utf8PathBuf, table: TableName) -> Self {
        let workers = default_workers();
        Self {
            source,
            destination,
            table,
            workers,
            batch_size: default_batch_size(workers),
            extension: DEFAULT_TILE_EXTENSION.to_owned(),
            read_failures: ReadFailurePolicy::default(),
        }
    }

    /// Override the worker count, rescaling the default batch size with it.
    #[must_use]
    pub fn with_workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = workers;
        self.batch_size = default_batch_size(workers);
        self
    }

    /// Override the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: NonZeroUsize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Override the recognised tile extension.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Override the reaction to unreadable tiles.
    #[must_use]
    pub fn with_read_failures(mut self, policy: ReadFailurePolicy) -> Self {
        self.read_failures = policy;
        self
    }
}

/// Import a tile cache into a fresh SQLite database.
///
/// The destination is deleted and recreated, the table created without
/// indexes, every batch committed in its own transaction, and the
/// `(z, x, y)` index built last. On error the database holds only the batches
/// committed so far and has no index.
///
/// # Examples
/// ```no_run
/// use camino::Utf8PathBuf;
/// use tilepack_core::TableName;
/// use tilepack_data::{ImportOptions, import_tiles};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let options = ImportOptions::new(
///     Utf8PathBuf::from("/srv/tiles"),
///     Utf8PathBuf::from("tiles.db"),
///     TableName::new("tiles")?,
/// );
/// let report = import_tiles(&options)?;
/// println!("imported {} tiles", report.tiles_written);
/// # Ok(())
/// # }
/// ```
pub fn import_tiles(options: &ImportOptions) -> Result<ImportReport, ImportError> {
    let started = Instant::now();
    info!(
        "start with {} workers and batch size {}",
        options.workers, options.batch_size
    );
    let session = ImportSession::new(
        options.workers,
        options.batch_size,
        TilePathParser::new(options.extension.as_str()),
    )?
    .with_read_failures(options.read_failures);

    let mut store = TileStore::create(&options.destination, options.table.clone())?;
    store.create_schema()?;

    info!("adding tiles from {}", options.source);
    let mut report = session.run(TreeWalker::new(&options.source), &mut store)?;

    info!("indexing {}", options.table);
    store.create_index()?;
    store.close()?;

    report.elapsed = started.elapsed();
    Ok(report)
}
