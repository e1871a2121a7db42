//! Posting list index under concurrent writers, and snapshot files

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use tempfile::TempDir;

use ldapdex::config::IndexSettings;
use ldapdex::index::{IndexRow, IndexSnapshot, PostingIndex};

fn settings() -> IndexSettings {
    IndexSettings::default()
        .with_initial_capacity(64)
        .with_shard_amount(8)
}

#[test]
fn concurrent_inserts_into_same_token_are_all_kept() {
    let index = Arc::new(PostingIndex::new(&settings()));
    let writers = 8u64;
    let per_writer = 250u64;

    let handles: Vec<_> = (0..writers)
        .map(|w| {
            let index = index.clone();
            thread::spawn(move || {
                for i in 0..per_writer {
                    index.insert("shared", w * per_writer + i);
                    index.insert(format!("writer-{}", w), i);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let shared = index.get("shared").unwrap();
    assert_eq!(shared.len() as u64, writers * per_writer);
    assert_eq!(index.row_count(), writers + 1);
    assert_eq!(index.len() as u64, index.row_count());
}

#[test]
fn racing_first_inserts_create_one_row() {
    let index = Arc::new(PostingIndex::new(&settings()));

    let handles: Vec<_> = (0..16u64)
        .map(|id| {
            let index = index.clone();
            thread::spawn(move || index.insert("fresh", id))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(index.row_count(), 1);
    assert_eq!(index.get("fresh").unwrap(), (0..16).collect::<Vec<_>>());
}

#[test]
fn legacy_snapshot_file_upgrades_on_write() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("index.bin");

    let mut rows = BTreeMap::new();
    rows.insert("ops".to_string(), IndexRow::Single(5));
    rows.insert("dev".to_string(), IndexRow::singleton(1));
    let bytes = IndexSnapshot::new(rows, 2).to_bytes().unwrap();
    std::fs::write(&path, bytes).unwrap();

    let index = PostingIndex::load_from(&path, &settings()).unwrap();
    assert_eq!(index.row_count(), 2);

    index.insert("ops", 9);
    assert_eq!(index.get("ops"), Some(vec![5, 9]));
    assert_eq!(index.row_count(), 2);

    index.save_to(&path).unwrap();
    let reloaded = PostingIndex::load_from(&path, &settings()).unwrap();
    assert_eq!(reloaded.row("ops"), Some(IndexRow::Set([5, 9].into_iter().collect())));
    assert_eq!(reloaded.row_count(), 2);
}

#[test]
fn undecodable_tokens_share_a_deterministic_key() {
    let index = PostingIndex::new(&settings());
    let latin1_cafe: &[u8] = b"caf\xe9";

    index.insert(latin1_cafe, 1);
    index.insert(latin1_cafe, 2);
    index.insert(b"caf\xe9".to_vec(), 3);

    assert_eq!(index.row_count(), 1);
    assert_eq!(index.get(latin1_cafe), Some(vec![1, 2, 3]));
    assert_eq!(index.tokens(), vec!["caf"]);
}

#[test]
fn missing_snapshot_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = PostingIndex::load_from(tmp.path().join("absent.bin"), &settings());
    assert!(matches!(result, Err(ldapdex::LdapdexError::Io(_))));
}
