//! Tests for defragmentation
//!
//! These tests verify:
//! - Tombstoned slots are dropped and live order is kept
//! - The live count and reported sizes after compaction
//! - Empty logs short-circuit without a temp file
//! - Fully live logs are rewritten byte for byte
//! - An unterminated last slot and records far larger than the buffers

use std::fs;
use std::path::PathBuf;

use fifolog::config::Config;
use fifolog::{DefragOutcome, LogStore};
use serde_json::{json, Value};
use tempfile::TempDir;
use tracing::Level;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, LogStore) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .path(temp_dir.path().join("test.log"))
        .auto_defrag_threshold(None)
        .build();
    let store = LogStore::open(config).unwrap();
    (temp_dir, store)
}

fn log_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("test.log")
}

fn temp_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("test.log.tmp")
}

fn item(i: usize) -> Value {
    json!({"test": format!("item{}", i)})
}

fn push_items(store: &mut LogStore, count: usize) {
    for i in 0..count {
        store.push(&item(i)).unwrap();
    }
}

// =============================================================================
// Defragment Tests
// =============================================================================

#[test]
fn test_defragment_after_two_removals() {
    let (_temp, mut store) = setup_temp_store();
    push_items(&mut store, 6);
    store.remove(1).unwrap();
    store.remove(3).unwrap();

    let before = store.fragmentation_ratio().unwrap();
    assert!(before > 0.0);

    store.defragment().unwrap();

    assert_eq!(store.fragmentation_ratio().unwrap(), 0.0);
    // live after the removals: item0, item2, item3, item5
    let third: Value = store.get_as(2).unwrap();
    assert_eq!(third, item(3));
}

#[test]
fn test_defragment_keeps_live_sequence() {
    let (temp, mut store) = setup_temp_store();
    push_items(&mut store, 8);
    store.remove(0).unwrap();
    store.remove(3).unwrap();
    store.remove(5).unwrap();
    let live_before: Vec<Value> = store.get_first(usize::MAX).unwrap();

    let outcome = store.defragment().unwrap();

    let live_after: Vec<Value> = store.get_first(usize::MAX).unwrap();
    assert_eq!(live_after, live_before);
    assert_eq!(store.len(), 5);
    assert_eq!(
        outcome,
        DefragOutcome {
            live_records: 5,
            bytes_before: 8 * 17,
            bytes_after: 5 * 17,
        }
    );
    assert_eq!(outcome.reclaimed(), 3 * 17);
    assert_eq!(fs::metadata(log_path(&temp)).unwrap().len(), 5 * 17);
    assert!(!temp_path(&temp).exists());
}

#[test]
fn test_defragment_empty_store_is_noop() {
    let (temp, mut store) = setup_temp_store();

    let outcome = store.defragment().unwrap();

    assert_eq!(outcome.live_records, 0);
    assert_eq!(outcome.bytes_before, 0);
    assert!(!temp_path(&temp).exists());
    assert!(log_path(&temp).exists());
}

#[test]
fn test_defragment_fully_live_log_is_identical() {
    let (temp, mut store) = setup_temp_store();
    push_items(&mut store, 4);
    let original = fs::read(log_path(&temp)).unwrap();

    store.defragment().unwrap();
    store.defragment().unwrap();

    assert_eq!(fs::read(log_path(&temp)).unwrap(), original);
    assert_eq!(store.len(), 4);
}

#[test]
fn test_defragment_all_tombstoned_leaves_empty_file() {
    let (temp, mut store) = setup_temp_store();
    push_items(&mut store, 3);
    store.remove_first(3).unwrap();

    let outcome = store.defragment().unwrap();

    assert_eq!(outcome.live_records, 0);
    assert!(store.is_empty());
    assert_eq!(fs::metadata(log_path(&temp)).unwrap().len(), 0);
}

#[test]
fn test_defragment_drops_blank_lines() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.log");
    fs::write(&path, "{\"n\":0}\n\n$\"n\":1}\n{\"n\":2}\n").unwrap();
    let mut store = LogStore::open_path(&path).unwrap();

    store.defragment().unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "{\"n\":0}\n{\"n\":2}\n");
    assert_eq!(store.len(), 2);
}

#[test]
fn test_operations_after_defragment() {
    let (_temp, mut store) = setup_temp_store();
    push_items(&mut store, 4);
    store.remove(3).unwrap();
    store.defragment().unwrap();

    store.push(&item(9)).unwrap();

    assert_eq!(store.len(), 4);
    let last: Value = serde_json::from_str(&store.get_last().unwrap().unwrap()).unwrap();
    assert_eq!(last, item(9));
    assert_eq!(store.remove(0).unwrap().as_deref(), Some(r#"{"test":"item0"}"#));
}

#[test]
fn test_defragment_unterminated_last_slot() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.log");
    fs::write(&path, "{\"test\":\"a\"}").unwrap();
    let mut store = LogStore::open(Config::builder().path(&path).build()).unwrap();

    // info-level fields are only evaluated with a subscriber installed
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(std::io::sink)
        .finish();
    let outcome = tracing::subscriber::with_default(subscriber, || store.defragment()).unwrap();

    assert_eq!(outcome.live_records, 1);
    assert_eq!(outcome.bytes_before, 12);
    assert_eq!(outcome.bytes_after, 13);
    assert_eq!(outcome.reclaimed(), 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), "{\"test\":\"a\"}\n");
    assert_eq!(store.get(0).unwrap(), r#"{"test":"a"}"#);
}

#[test]
fn test_defragment_records_larger_than_buffers() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .path(temp_dir.path().join("test.log"))
        .scan_buffer_size(8)
        .reverse_buffer_size(16)
        .auto_defrag_threshold(None)
        .build();
    let mut store = LogStore::open(config).unwrap();
    let records: Vec<String> = (0..6).map(|i| i.to_string().repeat(10_000)).collect();
    for record in &records {
        store.push(record).unwrap();
    }

    assert_eq!(store.remove_first(2).unwrap(), 2);
    store.remove(1).unwrap();
    assert!((store.fragmentation_ratio().unwrap() - 0.5).abs() < 1e-6);

    let outcome = store.defragment().unwrap();

    assert_eq!(outcome.live_records, 3);
    assert_eq!(outcome.reclaimed(), 3 * 10_003);
    assert_eq!(store.recount().unwrap(), 3);
    let live: Vec<String> = store.get_first(3).unwrap();
    assert_eq!(live, vec![records[2].clone(), records[4].clone(), records[5].clone()]);
}
