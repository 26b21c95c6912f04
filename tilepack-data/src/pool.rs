//! Fixed-size worker pool that turns a batch of paths into tile records.

use std::num::NonZeroUsize;

use camino::{Utf8Path, Utf8PathBuf};
use log::warn;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use thiserror::Error;
use tilepack_core::{TilePathParser, TileRecord};

/// How a batch reacts when a matched tile cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadFailurePolicy {
    /// Fail the batch, and with it the import.
    #[default]
    Abort,
    /// Log the failure and leave the tile out of the batch.
    Skip,
}

/// A matched tile could not be read from disk.
#[derive(Debug, Error)]
#[error("failed to read tile {path}")]
pub struct TileReadError {
    /// Path of the unreadable tile.
    pub path: Utf8PathBuf,
    /// Underlying IO error.
    #[source]
    pub source: std::io::Error,
}

/// The worker threads could not be started.
#[derive(Debug, Error)]
#[error("failed to start {workers} tile workers")]
pub struct PoolBuildError {
    /// Requested number of workers.
    pub workers: usize,
    /// Source error returned by `rayon`.
    #[source]
    pub source: ThreadPoolBuildError,
}

/// Records decoded from one batch of paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedBatch {
    /// Records in the order their paths were submitted.
    pub records: Vec<TileRecord>,
    /// Matched tiles skipped because they could not be read.
    pub unreadable: usize,
}

/// A `rayon` thread pool dedicated to parsing and loading tiles.
///
/// Workers never see the database: they only produce in-memory records that
/// the caller persists afterwards.
///
/// # Examples
/// ```no_run
/// use std::num::NonZeroUsize;
/// use camino::Utf8PathBuf;
/// use tilepack_core::TilePathParser;
/// use tilepack_data::{ReadFailurePolicy, TileWorkerPool};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = TileWorkerPool::new(NonZeroUsize::new(4).ok_or("zero workers")?)?;
/// let paths = vec![Utf8PathBuf::from("/srv/tiles/7/3/5.png")];
/// let decoded = pool.decode_batch(&TilePathParser::default(), &paths, ReadFailurePolicy::Abort)?;
/// println!("decoded {} tiles", decoded.records.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TileWorkerPool {
    pool: ThreadPool,
}

impl TileWorkerPool {
    /// Start `workers` named threads.
    pub fn new(workers: NonZeroUsize) -> Result<Self, PoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.get())
            .thread_name(|index| format!("tilepack-worker-{index}"))
            .build()
            .map_err(|source| PoolBuildError {
                workers: workers.get(),
                source,
            })?;
        Ok(Self { pool })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Parse and load every path in `paths` across the pool.
    ///
    /// Blocks until every path has been processed. Paths that are not tiles
    /// are dropped; the remaining records keep submission order. With
    /// [`ReadFailurePolicy::Abort`] the first unreadable tile, in submission
    /// order, is returned as the error.
    pub fn decode_batch(
        &self,
        parser: &TilePathParser,
        paths: &[Utf8PathBuf],
        policy: ReadFailurePolicy,
    ) -> Result<DecodedBatch, TileReadError> {
        let outcomes: Vec<_> = self.pool.install(|| {
            paths
                .par_iter()
                .map(|path| decode_tile(parser, path))
                .collect()
        });

        let mut decoded = DecodedBatch {
            records: Vec::with_capacity(outcomes.len()),
            unreadable: 0,
        };
        for outcome in outcomes {
            match (outcome, policy) {
                (Ok(Some(record)), _) => decoded.records.push(record),
                (Ok(None), _) => {}
                (Err(err), ReadFailurePolicy::Abort) => return Err(err),
                (Err(err), ReadFailurePolicy::Skip) => {
                    warn!("skipping unreadable tile {}: {}", err.path, err.source);
                    decoded.unreadable += 1;
                }
            }
        }
        Ok(decoded)
    }
}

/// Parse one path and, when it names a tile, load its bytes.
pub fn decode_tile(
    parser: &TilePathParser,
    path: &Utf8Path,
) -> Result<Option<TileRecord>, TileReadError> {
    let Some(coord) = parser.parse(path) else {
        return Ok(None);
    };
    let data = tilepack_fs::read_file_bytes(path).map_err(|source| TileReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(TileRecord::new(coord, data)))
}
