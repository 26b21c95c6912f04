//! Shared filesystem helpers built on `cap-std` and `camino`.
//!
//! Covers the three filesystem concerns of a tile import: walking the source
//! tree, reading tile bytes, and preparing the destination path.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io::{self, Read};
use std::path::Component;

mod walk;

pub use walk::TreeWalker;

/// Open a UTF-8 file path using ambient authority.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Resolve an ambient directory for the given path and return the directory with the file name.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("target should include a file name"))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Read the full contents of a file, following symbolic links.
///
/// Empty files yield an empty vector.
pub fn read_file_bytes(path: &Utf8Path) -> io::Result<Vec<u8>> {
    let mut file = open_utf8_file(path)?;
    let expected = usize::try_from(file.metadata()?.len()).unwrap_or(0);
    let mut buffer = Vec::with_capacity(expected);
    file.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Remove a file if it exists, returning whether anything was deleted.
///
/// A missing file or missing parent directory is not an error. Directories
/// are never removed; attempting to do so reports the underlying IO error.
pub fn remove_file_if_exists(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = match open_dir_and_file(path) {
        Ok(handles) => handles,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    match dir.remove_file(name.as_str()) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Return whether a path exists and is a directory, following symbolic links.
pub fn path_is_dir(path: &Utf8Path) -> io::Result<bool> {
    if path.file_name().is_none() {
        return fs_utf8::Dir::open_ambient_dir(path, ambient_authority()).map(|_| true);
    }
    let (dir, name) = open_dir_and_file(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_dir())
}

/// Ensure the parent directory for `path` exists, handling absolute paths safely for cap-std.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (base_dir, relative) = base_dir_and_relative(parent)?;
    if relative.as_os_str().is_empty() {
        return Ok(());
    }
    base_dir.create_dir_all(&relative)?;
    Ok(())
}

/// Split an absolute or relative parent path into an ambient base directory and a relative suffix.
pub fn base_dir_and_relative(parent: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_parent = parent.as_std_path();

    let (base, relative) = match std_parent.components().next() {
        // Windows absolute path with a drive or UNC prefix.
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;

            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .or_else(|_| std_parent.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other("failed to strip prefix from parent path"))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from absolute path"))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), std_parent.to_path_buf()),
    };

    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative = Utf8PathBuf::from_path_buf(relative)
        .map_err(|_| io::Error::other("non-UTF-8 parent path"))?;

    Ok((dir, relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::fs;
    use tempfile::TempDir;

    #[fixture]
    fn workspace() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
        (dir, root)
    }

    #[rstest]
    fn reads_exact_bytes(workspace: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workspace;
        let path = root.join("5.png");
        let payload = [0x89, b'P', b'N', b'G', 0, 255, 13, 10];
        fs::write(&path, payload).expect("write tile");

        assert_eq!(read_file_bytes(&path).expect("read tile"), payload);
    }

    #[rstest]
    fn reads_empty_file_as_empty_vec(workspace: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workspace;
        let path = root.join("6.png");
        fs::write(&path, b"").expect("write empty tile");

        assert!(read_file_bytes(&path).expect("read tile").is_empty());
    }

    #[rstest]
    fn reading_missing_file_reports_not_found(workspace: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workspace;
        let err = read_file_bytes(&root.join("absent.png")).expect_err("missing file");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[rstest]
    fn reads_through_symbolic_links(workspace: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workspace;
        let target = root.join("blank.png");
        fs::write(&target, b"blank").expect("write shared tile");
        fs::create_dir_all(root.join("3/2")).expect("create tile dir");
        let link = root.join("3/2/1.png");
        std::os::unix::fs::symlink(&target, &link).expect("link tile");

        assert_eq!(read_file_bytes(&link).expect("read linked tile"), b"blank");
    }

    #[rstest]
    fn removes_existing_file(workspace: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workspace;
        let path = root.join("tiles.db");
        fs::write(&path, b"stale").expect("write stale database");

        assert!(remove_file_if_exists(&path).expect("remove stale file"));
        assert!(!path.exists());
    }

    #[rstest]
    #[case::missing_file("tiles.db")]
    #[case::missing_parent("nested/deeper/tiles.db")]
    fn removing_absent_file_is_a_no_op(
        workspace: (TempDir, Utf8PathBuf),
        #[case] relative: &str,
    ) {
        let (_guard, root) = workspace;
        assert!(!remove_file_if_exists(&root.join(relative)).expect("nothing to remove"));
    }

    #[rstest]
    fn refuses_to_remove_directories(workspace: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workspace;
        let path = root.join("tiles.db");
        fs::create_dir(&path).expect("create directory");

        assert!(remove_file_if_exists(&path).is_err());
        assert!(path.is_dir());
    }

    #[rstest]
    fn distinguishes_directories_from_files(workspace: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workspace;
        let file = root.join("notes.txt");
        fs::write(&file, b"notes").expect("write file");

        assert!(path_is_dir(&root).expect("inspect root"));
        assert!(!path_is_dir(&file).expect("inspect file"));
        let missing = path_is_dir(&root.join("absent")).expect_err("missing path");
        assert_eq!(missing.kind(), io::ErrorKind::NotFound);
    }

    #[rstest]
    fn creates_nested_parent_directories(workspace: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workspace;
        let path = root.join("out/packs/tiles.db");

        ensure_parent_dir(&path).expect("create parents");
        assert!(root.join("out/packs").is_dir());
    }
}
