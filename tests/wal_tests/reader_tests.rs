//! Tests for WAL file discovery and reading
//!
//! These tests verify:
//! - Recursive discovery in name order
//! - Suffix filtering
//! - Missing roots and unreadable roots
//! - Malformed and truncated entries are skipped

use std::fs;
use std::path::Path;

use bytes::BytesMut;
use dbwire::wal::{discover_wal_files, WalFrame, WalOp, WalReader, WAL_SUFFIX};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn write_frames(path: &Path, payloads: &[&str]) {
    let mut buf = BytesMut::new();
    for payload in payloads {
        WalFrame::new(WalOp::Insert, payload.to_string())
            .encode_into(&mut buf)
            .unwrap();
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, &buf).unwrap();
}

fn names(root: &Path, files: &[std::path::PathBuf]) -> Vec<String> {
    files
        .iter()
        .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect()
}

// =============================================================================
// Discovery Tests
// =============================================================================

#[test]
fn test_discover_nested_in_name_order() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write_frames(&root.join("b.wal"), &[]);
    write_frames(&root.join("a/z.wal"), &[]);
    write_frames(&root.join("a/inner/y.wal"), &[]);
    write_frames(&root.join("c.wal"), &[]);

    let files = discover_wal_files(root, WAL_SUFFIX).unwrap();
    assert_eq!(names(root, &files), vec!["a/inner/y.wal", "a/z.wal", "b.wal", "c.wal"]);
}

#[test]
fn test_discover_filters_by_suffix() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write_frames(&root.join("keep.wal"), &[]);
    fs::write(root.join("notes.txt"), b"ignored").unwrap();
    fs::write(root.join("wal"), b"ignored").unwrap();
    fs::create_dir_all(root.join("dir.wal")).unwrap();

    let files = discover_wal_files(root, WAL_SUFFIX).unwrap();
    assert_eq!(names(root, &files), vec!["keep.wal"]);

    let logs = discover_wal_files(root, ".txt").unwrap();
    assert_eq!(names(root, &logs), vec!["notes.txt"]);
}

#[test]
fn test_discover_missing_root_is_empty() {
    let dir = TempDir::new().unwrap();
    let files = discover_wal_files(&dir.path().join("absent"), WAL_SUFFIX).unwrap();
    assert!(files.is_empty());
}

#[test]
fn test_discover_root_that_is_a_file_fails() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("plain.wal");
    fs::write(&file, b"").unwrap();

    assert!(discover_wal_files(&file, WAL_SUFFIX).is_err());
}

// =============================================================================
// Reader Tests
// =============================================================================

#[test]
fn test_scan_decodes_records_in_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("log.wal");
    write_frames(
        &path,
        &[r#"{"op":"PUT","data":{"id":"1"}}"#, r#"{"op":"DELETE","id":"1"}"#],
    );

    let reader = WalReader::open(&path).unwrap();
    let scan = reader.scan();

    assert_eq!(reader.path(), path.as_path());
    assert_eq!(scan.frames, 2);
    assert_eq!(scan.malformed, 0);
    assert!(!scan.truncated);
    assert_eq!(scan.records[0].op.as_deref(), Some("PUT"));
    assert_eq!(scan.records[1].op.as_deref(), Some("DELETE"));
}

#[test]
fn test_scan_skips_malformed_payloads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("log.wal");
    write_frames(
        &path,
        &[r#"{"op":"PUT"}"#, "not json", r#"{"op":"UPDATE"}"#],
    );

    let scan = WalReader::open(&path).unwrap().scan();

    assert_eq!(scan.frames, 3);
    assert_eq!(scan.malformed, 1);
    assert_eq!(scan.records.len(), 2);
    assert_eq!(scan.records[1].op.as_deref(), Some("UPDATE"));
}

#[test]
fn test_scan_ignores_truncated_tail() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("log.wal");
    write_frames(&path, &[r#"{"op":"PUT"}"#, r#"{"op":"DELETE","id":"9"}"#]);

    let len = fs::metadata(&path).unwrap().len();
    fs::OpenOptions::new()
        .write(true)
        .open(&path)
        .unwrap()
        .set_len(len - 3)
        .unwrap();

    let scan = WalReader::open(&path).unwrap().scan();

    assert_eq!(scan.records.len(), 1);
    assert!(scan.truncated);
}

#[test]
fn test_open_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    assert!(WalReader::open(&dir.path().join("nope.wal")).is_err());
}
