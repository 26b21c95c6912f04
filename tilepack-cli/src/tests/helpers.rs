//! Test helpers for building tile caches and invoking the import command.

use super::*;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// A scratch directory holding a tile cache and room for a database.
pub(super) struct TileCache {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl TileCache {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        fs::create_dir_all(root.join("cache")).expect("create cache dir");
        Self { _dir: dir, root }
    }

    /// Cache holding `7/3/5.png`, an empty `7/3/6.png` and `notes.txt`.
    pub(super) fn with_sample_tiles() -> Self {
        let cache = Self::new();
        cache.write("7/3/5.png", b"0123456789");
        cache.write("7/3/6.png", b"");
        cache.write("notes.txt", b"not a tile");
        cache
    }

    pub(super) fn write(&self, relative: &str, contents: &[u8]) {
        let path = self.source().join(relative);
        fs::create_dir_all(path.parent().expect("tile has parent")).expect("create tile dir");
        fs::write(&path, contents).expect("write tile");
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn source(&self) -> Utf8PathBuf {
        self.root.join("cache")
    }

    pub(super) fn database(&self) -> Utf8PathBuf {
        self.root.join("tiles.db")
    }
}

impl std::fmt::Debug for TileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileCache").field("root", &self.root).finish()
    }
}

/// Parse `args` as `tilepack import …` and run it, capturing stdout.
pub(super) fn run_cli(args: &[String]) -> Result<String, CliError> {
    let mut invocation = vec!["tilepack".to_owned(), "import".to_owned()];
    invocation.extend(args.iter().cloned());
    let cli = Cli::try_parse_from(invocation).map_err(CliError::ArgumentParsing)?;
    let Command::Import(import_args) = cli.command;
    let mut output = Vec::new();
    import::run_import_with(import_args, &mut output)?;
    Ok(String::from_utf8(output).expect("summary is utf-8"))
}

/// Read every `(z, x, y, data)` row from `table`, ordered by coordinate.
pub(super) fn read_rows(
    database: &Utf8Path,
    table: &str,
) -> Vec<(i64, i64, i64, Option<Vec<u8>>)> {
    let conn = rusqlite::Connection::open(database).expect("open database");
    let mut stmt = conn
        .prepare(&format!(
            "SELECT z, x, y, data FROM \"{table}\" ORDER BY z, x, y"
        ))
        .expect("prepare select");
    stmt.query_map([], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    })
    .expect("query tiles")
    .collect::<Result<_, _>>()
    .expect("read tiles")
}
