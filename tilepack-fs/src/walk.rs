//! Lazy depth-first enumeration of regular files beneath a directory.

use std::{fmt, fs, io, vec};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use log::{debug, warn};

/// Iterator over every regular file below a root directory.
///
/// Traversal is depth-first and driven by an explicit stack of directory
/// listings. Each directory is listed in full and its handle closed before
/// any child is visited, so at most one directory handle is open at a time
/// however deep the tree goes. Entries are yielded in filesystem enumeration
/// order.
///
/// Directories that cannot be opened or listed are treated as empty.
/// Symbolic links to files are yielded; symbolic links to directories are
/// not followed, so link cycles cannot trap the walk.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use tilepack_fs::TreeWalker;
///
/// for path in TreeWalker::new(Utf8Path::new("/srv/tiles")) {
///     println!("{path}");
/// }
/// ```
pub struct TreeWalker {
    frames: Vec<Frame>,
}

struct Frame {
    path: Utf8PathBuf,
    entries: vec::IntoIter<Entry>,
}

struct Entry {
    name: String,
    kind: EntryKind,
}

#[derive(Clone, Copy)]
enum EntryKind {
    File,
    Directory,
    Link,
}

impl TreeWalker {
    /// Start a walk rooted at `root`.
    ///
    /// The root is listed eagerly; an unreadable root produces an empty walk.
    #[must_use]
    pub fn new(root: &Utf8Path) -> Self {
        let frames = Frame::list(root.to_path_buf()).into_iter().collect();
        Self { frames }
    }
}

impl fmt::Debug for TreeWalker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeWalker")
            .field(
                "pending",
                &self.frames.iter().map(|frame| frame.path.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Iterator for TreeWalker {
    type Item = Utf8PathBuf;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.frames.last_mut()?;
            let Some(entry) = frame.entries.next() else {
                self.frames.pop();
                continue;
            };
            let path = frame.path.join(&entry.name);
            match entry.kind {
                EntryKind::File => return Some(path),
                EntryKind::Directory => {
                    if let Some(child) = Frame::list(path) {
                        self.frames.push(child);
                    }
                }
                // Link targets may live outside the walked tree.
                EntryKind::Link => match fs::metadata(&path) {
                    Ok(meta) if meta.is_file() => return Some(path),
                    Ok(_) => {}
                    Err(err) => debug!("skipping dangling link {path}: {err}"),
                },
            }
        }
    }
}

impl Frame {
    /// Read the whole listing of `path`, closing the directory handle before
    /// returning.
    fn list(path: Utf8PathBuf) -> Option<Self> {
        let listing = fs_utf8::Dir::open_ambient_dir(&path, ambient_authority())
            .and_then(|dir| dir.entries())
            .map(|entries| entries.filter_map(|next| classify(&path, next)).collect::<Vec<_>>());
        match listing {
            Ok(entries) => Some(Self {
                path,
                entries: entries.into_iter(),
            }),
            Err(err) => {
                report_unreadable_dir(&path, &err);
                None
            }
        }
    }
}

fn classify(dir: &Utf8Path, next: io::Result<fs_utf8::DirEntry>) -> Option<Entry> {
    let entry = match next {
        Ok(entry) => entry,
        Err(err) => {
            debug!("skipping unreadable entry in {dir}: {err}");
            return None;
        }
    };
    let name = match entry.file_name() {
        Ok(name) => name,
        Err(err) => {
            warn!("skipping entry with a non-UTF-8 name in {dir}: {err}");
            return None;
        }
    };
    let file_type = match entry.file_type() {
        Ok(file_type) => file_type,
        Err(err) => {
            debug!("skipping {dir}/{name}: {err}");
            return None;
        }
    };
    let kind = if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file() {
        EntryKind::File
    } else if file_type.is_symlink() {
        EntryKind::Link
    } else {
        return None;
    };
    Some(Entry { name, kind })
}

fn report_unreadable_dir(path: &Utf8Path, err: &io::Error) {
    if is_descriptor_exhaustion(err) {
        warn!("skipping directory {path}: out of file descriptors: {err}");
    } else {
        debug!("treating unreadable directory {path} as empty: {err}");
    }
}

/// Whether `err` reports that the process or system file table is full.
fn is_descriptor_exhaustion(err: &io::Error) -> bool {
    // EMFILE and ENFILE on Linux and the BSDs; ERROR_TOO_MANY_OPEN_FILES on Windows.
    const EXHAUSTION_CODES: &[i32] = if cfg!(windows) { &[4] } else { &[23, 24] };
    err.raw_os_error()
        .is_some_and(|code| EXHAUSTION_CODES.contains(&code))
}
