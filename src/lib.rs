//! Facade crate for tilepack, a bulk loader for z/x/y tile caches.
//!
//! This crate re-exports the tile domain types and the SQLite import pipeline
//! so callers can depend on a single crate.

#![forbid(unsafe_code)]

pub use tilepack_core::{
    DEFAULT_TILE_EXTENSION, TableName, TableNameError, TileCoord, TilePathParser, TileRecord,
};

pub use tilepack_data::{
    ImportError, ImportOptions, ImportReport, ReadFailurePolicy, TileSink, TileStore,
    TileStoreError, default_batch_size, default_workers, import_tiles,
};
