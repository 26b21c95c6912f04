//! Validated names for the destination tile table.

use std::fmt;

use thiserror::Error;

/// A SQL identifier that is safe to interpolate into schema statements.
///
/// Names start with an ASCII letter or underscore and continue with ASCII
/// letters, digits or underscores. Statements still quote the name, so
/// keywords such as `order` are accepted.
///
/// # Examples
///
/// ```
/// use tilepack_core::TableName;
///
/// # fn main() -> Result<(), tilepack_core::TableNameError> {
/// let table = TableName::new("osm_tiles")?;
/// assert_eq!(table.quoted(), "\"osm_tiles\"");
/// assert_eq!(table.index_name(), "\"osm_tiles_zxy\"");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

/// Errors returned by [`TableName::new`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableNameError {
    /// The name was empty.
    #[error("table name must not be empty")]
    Empty,
    /// The name contained a character outside `[A-Za-z0-9_]`, or began with
    /// a digit.
    #[error("table name {name:?} must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidCharacter {
        /// The rejected name.
        name: String,
    },
}

impl TableName {
    /// Validate and wrap a table name.
    pub fn new(name: impl Into<String>) -> Result<Self, TableNameError> {
        let owned: String = name.into();
        let mut chars = owned.chars();
        let Some(first) = chars.next() else {
            return Err(TableNameError::Empty);
        };
        let valid_first = first.is_ascii_alphabetic() || first == '_';
        if !valid_first || !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
            return Err(TableNameError::InvalidCharacter { name: owned });
        }
        Ok(Self(owned))
    }

    /// The bare name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name wrapped in SQL double quotes.
    #[must_use]
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }

    /// Quoted name of the composite `(z, x, y)` index for this table.
    #[must_use]
    pub fn index_name(&self) -> String {
        format!("\"{}_zxy\"", self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
