//! Tests for the startup scan
//!
//! These tests verify:
//! - Scanning an empty log
//! - Last-write-wins while rebuilding the KeyDir
//! - Value locations recorded without reading values
//! - Strict vs. DiscardPartialTail handling of incomplete records

use std::io::Cursor;

use caskdb::config::RecoveryMode;
use caskdb::format::encode_kv;
use caskdb::keydir::KeyDirEntry;
use caskdb::scan::scan_log;
use caskdb::CaskError;

// =============================================================================
// Helper Functions
// =============================================================================

fn build_log(records: &[(u64, &str, &str)]) -> Vec<u8> {
    let mut log = Vec::new();
    for (ts, key, value) in records {
        let (_, record) = encode_kv(*ts, key, value).unwrap();
        log.extend_from_slice(&record);
    }
    log
}

fn scan(log: &[u8], mode: RecoveryMode) -> caskdb::Result<(caskdb::keydir::KeyDir, caskdb::scan::ScanResult)> {
    scan_log(&mut Cursor::new(log), log.len() as u64, 0, mode)
}

// =============================================================================
// Clean Log Tests
// =============================================================================

#[test]
fn test_scan_empty_log() {
    let (key_dir, result) = scan(&[], RecoveryMode::Strict).unwrap();

    assert!(key_dir.is_empty());
    assert_eq!(result.records_scanned, 0);
    assert_eq!(result.valid_length, 0);
    assert!(!result.was_truncated);
}

#[test]
fn test_scan_records_value_locations() {
    let log = build_log(&[(5, "hamlet", "shakespeare"), (6, "emma", "austen")]);

    let (key_dir, result) = scan(&log, RecoveryMode::Strict).unwrap();

    assert_eq!(result.records_scanned, 2);
    assert_eq!(result.keys_indexed, 2);
    assert_eq!(result.valid_length, log.len() as u64);
    assert_eq!(
        key_dir.get("hamlet"),
        Some(&KeyDirEntry {
            file_id: 0,
            value_size: 11,
            value_position: 18,
            timestamp: 5,
        })
    );

    let emma = key_dir.get("emma").unwrap();
    assert_eq!(emma.value_position, 29 + 12 + 4);
    let start = emma.value_position as usize;
    assert_eq!(&log[start..start + emma.value_size as usize], b"austen");
}

#[test]
fn test_scan_last_write_wins() {
    let log = build_log(&[(1, "k", "first"), (2, "x", "y"), (3, "k", "second")]);

    let (key_dir, result) = scan(&log, RecoveryMode::Strict).unwrap();

    assert_eq!(result.records_scanned, 3);
    assert_eq!(key_dir.len(), 2);

    let entry = key_dir.get("k").unwrap();
    assert_eq!(entry.timestamp, 3);
    let start = entry.value_position as usize;
    assert_eq!(&log[start..start + entry.value_size as usize], b"second");
}

#[test]
fn test_scan_empty_key_and_value() {
    let log = build_log(&[(1, "", "")]);

    let (key_dir, result) = scan(&log, RecoveryMode::Strict).unwrap();

    assert_eq!(result.records_scanned, 1);
    assert_eq!(key_dir.get("").unwrap().value_size, 0);
}

// =============================================================================
// Incomplete Record Tests
// =============================================================================

#[test]
fn test_strict_partial_header() {
    let mut log = build_log(&[(1, "k", "v")]);
    log.extend_from_slice(&[0u8; 8]);

    match scan(&log, RecoveryMode::Strict) {
        Err(CaskError::CorruptStore { offset, reason }) => {
            assert_eq!(offset, 15);
            assert!(reason.contains("12 byte header"));
        }
        other => panic!("expected CorruptStore, got {:?}", other),
    }
}

#[test]
fn test_strict_partial_body() {
    let full = build_log(&[(1, "k", "v"), (2, "key", "value")]);
    let log = &full[..full.len() - 2];

    assert!(matches!(
        scan(log, RecoveryMode::Strict),
        Err(CaskError::CorruptStore { offset: 15, .. })
    ));
}

#[test]
fn test_discard_partial_header() {
    let mut log = build_log(&[(1, "k", "v")]);
    log.extend_from_slice(&[0u8; 8]);

    let (key_dir, result) = scan(&log, RecoveryMode::DiscardPartialTail).unwrap();

    assert_eq!(key_dir.len(), 1);
    assert_eq!(result.records_scanned, 1);
    assert_eq!(result.valid_length, 15);
    assert_eq!(result.discarded_bytes, 8);
    assert!(result.was_truncated);
}

#[test]
fn test_discard_partial_body() {
    let full = build_log(&[(1, "k", "v"), (2, "key", "value")]);
    let log = &full[..full.len() - 2];

    let (key_dir, result) = scan(log, RecoveryMode::DiscardPartialTail).unwrap();

    assert!(key_dir.contains_key("k"));
    assert!(!key_dir.contains_key("key"));
    assert_eq!(result.valid_length, 15);
    assert_eq!(result.discarded_bytes, (log.len() - 15) as u64);
}

#[test]
fn test_non_ascii_key_is_corruption() {
    let mut log = build_log(&[(1, "k", "v")]);
    log[12] = 0xC3;

    assert!(matches!(
        scan(&log, RecoveryMode::DiscardPartialTail),
        Err(CaskError::CorruptStore { offset: 0, .. })
    ));
}
