//! SQLite persistence for tile records.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use rusqlite::{Connection, Error as SqliteError, Transaction};
use thiserror::Error;
use tilepack_core::{TableName, TileCoord, TileRecord};

/// Errors raised while preparing or writing the tile database.
#[derive(Debug, Error)]
pub enum TileStoreError {
    /// Failed to create the parent directory for the database file.
    #[error("failed to create parent directory for {path}")]
    CreateDirectory {
        /// Destination database path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A database from an earlier run could not be deleted.
    #[error("failed to remove existing database {path}")]
    RemoveExisting {
        /// Destination database path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}")]
    Open {
        /// Destination database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Dropping or creating the tile table failed.
    #[error("failed to create tile table {table}")]
    CreateSchema {
        /// Table being created.
        table: TableName,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Beginning a batch transaction failed.
    #[error("failed to begin tile batch transaction")]
    BeginTransaction {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Preparing the insert statement failed.
    #[error("failed to prepare tile insert statement")]
    PrepareInsert {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Writing a tile row failed.
    #[error("failed to insert tile {coord}")]
    InsertRow {
        /// Coordinates of the tile being inserted.
        coord: TileCoord,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Committing a batch transaction failed.
    #[error("failed to commit tile batch transaction")]
    Commit {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Building the `(z, x, y)` index failed.
    #[error("failed to index tile table {table}")]
    CreateIndex {
        /// Table being indexed.
        table: TableName,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Reading back from the tile table failed.
    #[error("failed to query tile table {table}")]
    Query {
        /// Table being queried.
        table: TableName,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Closing the connection failed.
    #[error("failed to close SQLite database")]
    Close {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}

/// Destination for committed batches of tiles.
///
/// Each call represents one atomic unit: either every record of the batch is
/// persisted or none is.
pub trait TileSink {
    /// Persist one batch of records.
    fn write_batch(&mut self, records: &[TileRecord]) -> Result<(), TileStoreError>;
}

/// Files SQLite may keep next to a database, named `<database><suffix>`.
const SIDECAR_SUFFIXES: [&str; 3] = ["-journal", "-wal", "-shm"];

fn remove_stale(path: &Utf8Path) -> Result<bool, TileStoreError> {
    tilepack_fs::remove_file_if_exists(path).map_err(|source| TileStoreError::RemoveExisting {
        path: path.to_path_buf(),
        source,
    })
}

/// A freshly created SQLite tile database.
///
/// # Examples
/// ```
/// use tilepack_core::{TableName, TileCoord, TileRecord};
/// use tilepack_data::{TileSink, TileStore};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = TileStore::open_in_memory(TableName::new("tiles")?)?;
/// store.create_schema()?;
/// store.write_batch(&[TileRecord::new(TileCoord::new(0, 0, 0), b"png".to_vec())])?;
/// store.create_index()?;
/// assert_eq!(store.row_count()?, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TileStore {
    connection: Connection,
    table: TableName,
}

impl TileStore {
    /// Create the database at `path`, deleting any file already there.
    ///
    /// Journal and WAL files left beside an earlier database are deleted too,
    /// so SQLite never replays them into the new file. Parent directories are
    /// created as needed. The tile table itself is created by
    /// [`TileStore::create_schema`].
    pub fn create(path: &Utf8Path, table: TableName) -> Result<Self, TileStoreError> {
        tilepack_fs::ensure_parent_dir(path).map_err(|source| {
            TileStoreError::CreateDirectory {
                path: path.to_path_buf(),
                source,
            }
        })?;
        if remove_stale(path)? {
            info!("removed existing database {path}");
        }
        for suffix in SIDECAR_SUFFIXES {
            remove_stale(&Utf8PathBuf::from(format!("{path}{suffix}")))?;
        }
        let connection =
            Connection::open(path.as_std_path()).map_err(|source| TileStoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { connection, table })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory(table: TableName) -> Result<Self, TileStoreError> {
        let connection = Connection::open_in_memory().map_err(|source| TileStoreError::Open {
            path: Utf8PathBuf::from(":memory:"),
            source,
        })?;
        Ok(Self { connection, table })
    }

    /// Drop the tile table if present and create it empty, without indexes.
    pub fn create_schema(&self) -> Result<(), TileStoreError> {
        let table = self.table.quoted();
        self.connection
            .execute_batch(&format!(
                "DROP TABLE IF EXISTS {table};
                CREATE TABLE {table} (
                    z INTEGER NOT NULL,
                    x INTEGER NOT NULL,
                    y INTEGER NOT NULL,
                    data BLOB
                );"
            ))
            .map_err(|source| TileStoreError::CreateSchema {
                table: self.table.clone(),
                source,
            })
    }

    /// Begin the transaction for one batch.
    ///
    /// Dropping the returned transaction without committing rolls it back.
    pub fn begin_batch(&mut self) -> Result<TileTransaction<'_>, TileStoreError> {
        let insert_sql = format!(
            "INSERT INTO {} (z, x, y, data) VALUES (?1, ?2, ?3, ?4)",
            self.table.quoted()
        );
        let transaction = self
            .connection
            .transaction()
            .map_err(|source| TileStoreError::BeginTransaction { source })?;
        Ok(TileTransaction {
            transaction,
            insert_sql,
        })
    }

    /// Build the composite `(z, x, y)` index.
    ///
    /// Call once, after every batch has been committed.
    pub fn create_index(&self) -> Result<(), TileStoreError> {
        self.connection
            .execute(
                &format!(
                    "CREATE INDEX {} ON {} (z, x, y)",
                    self.table.index_name(),
                    self.table.quoted()
                ),
                [],
            )
            .map(|_| ())
            .map_err(|source| TileStoreError::CreateIndex {
                table: self.table.clone(),
                source,
            })
    }

    /// Number of rows currently in the tile table.
    pub fn row_count(&self) -> Result<u64, TileStoreError> {
        let count: i64 = self
            .connection
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", self.table.quoted()),
                [],
                |row| row.get(0),
            )
            .map_err(|source| TileStoreError::Query {
                table: self.table.clone(),
                source,
            })?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Close the connection, surfacing any error SQLite reports on shutdown.
    pub fn close(self) -> Result<(), TileStoreError> {
        self.connection
            .close()
            .map_err(|(_, source)| TileStoreError::Close { source })
    }
}

impl TileSink for TileStore {
    fn write_batch(&mut self, records: &[TileRecord]) -> Result<(), TileStoreError> {
        let transaction = self.begin_batch()?;
        transaction.insert_all(records)?;
        transaction.commit()
    }
}

/// One batch's transaction, reusing a single prepared insert for every row.
#[derive(Debug)]
pub struct TileTransaction<'conn> {
    transaction: Transaction<'conn>,
    insert_sql: String,
}

impl TileTransaction<'_> {
    /// Insert every record in order.
    ///
    /// Empty tiles are stored with a `NULL` blob.
    pub fn insert_all(&self, records: &[TileRecord]) -> Result<(), TileStoreError> {
        if records.is_empty() {
            return Ok(());
        }
        let mut statement = self
            .transaction
            .prepare_cached(&self.insert_sql)
            .map_err(|source| TileStoreError::PrepareInsert { source })?;
        for record in records {
            let TileCoord { z, x, y } = record.coord;
            let data = (!record.is_empty()).then_some(record.data.as_slice());
            statement
                .execute((i64::from(z), i64::from(x), i64::from(y), data))
                .map_err(|source| TileStoreError::InsertRow {
                    coord: record.coord,
                    source,
                })?;
        }
        Ok(())
    }

    /// Commit the batch.
    pub fn commit(self) -> Result<(), TileStoreError> {
        self.transaction
            .commit()
            .map_err(|source| TileStoreError::Commit { source })
    }
}
