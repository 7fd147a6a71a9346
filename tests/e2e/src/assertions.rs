//! Filesystem assertions for live tests

use rand::Rng;
use std::fs;
use std::path::Path;

/// Assert that a path does not exist at all
pub fn assert_not_exists(path: &Path) {
    assert!(
        !path.exists(),
        "Expected path {:?} to not exist, but it does",
        path
    );
}

/// Assert that a file has the expected content
pub fn assert_file_content(path: &Path, expected: &[u8]) {
    let actual = fs::read(path).unwrap_or_else(|e| panic!("Failed to read file {:?}: {}", path, e));
    assert_eq!(
        actual,
        expected,
        "File content mismatch at {:?}\nExpected {} bytes, got {} bytes",
        path,
        expected.len(),
        actual.len()
    );
}

/// Assert that a directory is empty
pub fn assert_dir_empty(path: &Path) {
    let entries: Vec<_> = fs::read_dir(path)
        .unwrap_or_else(|e| panic!("Failed to read directory {:?}: {}", path, e))
        .filter_map(|e| e.ok().map(|e| e.file_name()))
        .collect();
    assert!(
        entries.is_empty(),
        "Expected directory {:?} to be empty, but it contains {:?}",
        path,
        entries
    );
}

/// Generate random bytes
pub fn random_bytes(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}
