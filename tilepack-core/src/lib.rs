//! Core domain types for tilepack.
//!
//! These models describe map tiles independently of where they come from or
//! where they are stored. Constructors validate their input so downstream
//! components can build SQL and file paths without re-checking it.
#![forbid(unsafe_code)]

mod path;
mod table;

pub use path::{DEFAULT_TILE_EXTENSION, TilePathParser};
pub use table::{TableName, TableNameError};

use std::fmt;

/// Zoom, column and row of a single map tile.
///
/// # Examples
///
/// ```
/// use tilepack_core::TileCoord;
///
/// let coord = TileCoord::new(7, 3, 5);
/// assert_eq!(coord.to_string(), "7/3/5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileCoord {
    /// Zoom level.
    pub z: u32,
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl TileCoord {
    /// Construct a coordinate triple.
    #[must_use]
    pub const fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// A tile's coordinates together with the raw bytes of its image.
///
/// `data` is stored verbatim; an empty vector represents an empty source
/// file and is still persisted as a row.
///
/// # Examples
///
/// ```
/// use tilepack_core::{TileCoord, TileRecord};
///
/// let record = TileRecord::new(TileCoord::new(0, 0, 0), b"\x89PNG".to_vec());
/// assert_eq!(record.data.len(), 4);
/// assert!(!record.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRecord {
    /// Coordinates parsed from the tile's path.
    pub coord: TileCoord,
    /// Raw file contents.
    pub data: Vec<u8>,
}

impl TileRecord {
    /// Construct a record from coordinates and file contents.
    #[must_use]
    pub const fn new(coord: TileCoord, data: Vec<u8>) -> Self {
        Self { coord, data }
    }

    /// Whether the source file was empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
