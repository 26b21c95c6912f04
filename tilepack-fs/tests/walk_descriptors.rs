//! Descriptor usage of the tree walker on deep directory trees.
//!
//! Kept in its own test binary so no concurrently running test opens or
//! closes descriptors while they are being counted.

#![cfg(target_os = "linux")]

use std::fs;

use camino::Utf8PathBuf;
use rstest::rstest;
use tempfile::TempDir;
use tilepack_fs::TreeWalker;

const DEPTH: usize = 200;

fn open_descriptors() -> usize {
    fs::read_dir("/proc/self/fd")
        .expect("list open descriptors")
        .count()
}

#[rstest]
fn deep_walks_hold_a_bounded_number_of_descriptors() {
    let dir = TempDir::new().expect("create temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
    let mut leaf_dir = root.clone();
    for level in 0..DEPTH {
        leaf_dir.push(format!("d{level}"));
    }
    fs::create_dir_all(&leaf_dir).expect("create deep tree");
    fs::write(leaf_dir.join("1.png"), b"leaf").expect("write leaf");
    fs::write(leaf_dir.join("2.png"), b"leaf").expect("write sibling");

    let before = open_descriptors();
    let mut walker = TreeWalker::new(&root);
    let first = walker.next().expect("first leaf");
    let during = open_descriptors();
    let rest: Vec<_> = walker.collect();

    assert!(first.starts_with(&leaf_dir), "unexpected path {first}");
    assert_eq!(rest.len(), 1);
    assert!(
        during <= before + 2,
        "walk paused {DEPTH} levels deep held {} extra descriptors",
        during.saturating_sub(before)
    );
}
