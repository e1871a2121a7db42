use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::config::IndexSettings;
use crate::error::{LdapdexError, Result};
use crate::index::normalize::normalize_token;
use crate::index::row::{IndexRow, RowInsert};
use crate::index::snapshot::{IndexSnapshot, SNAPSHOT_VERSION};
use crate::metrics::LdapdexMetrics;
use crate::models::DocumentId;

/// Token to document-id-set mapping with a row creation counter.
///
/// Inserts into the same token are serialized by the map shard lock, so
/// concurrent inserts never lose a posting.
pub struct PostingIndex {
    rows: DashMap<String, IndexRow>,
    length: AtomicU64,
    metrics: Option<LdapdexMetrics>,
}

impl PostingIndex {
    pub fn new(settings: &IndexSettings) -> Self {
        let shards = settings.shard_amount.max(2).next_power_of_two();
        Self {
            rows: DashMap::with_capacity_and_shard_amount(settings.initial_capacity, shards),
            length: AtomicU64::new(0),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: LdapdexMetrics) -> Self {
        metrics.set_index_rows(self.row_count());
        self.metrics = Some(metrics);
        self
    }

    /// Add `doc_id` to the posting list of `token`.
    ///
    /// A new token creates a row and bumps the row counter. An existing
    /// legacy single-value row is upgraded to a set without touching the
    /// counter. Never fails.
    pub fn insert(&self, token: impl AsRef<[u8]>, doc_id: DocumentId) {
        let token = normalize_token(token.as_ref());
        if token.folded {
            debug!(key = %token.key, "token is not valid UTF-8, folded to ASCII");
        }

        match self.rows.entry(token.key.into_owned()) {
            Entry::Vacant(vacant) => {
                vacant.insert(IndexRow::singleton(doc_id));
                let rows = self.length.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(metrics) = &self.metrics {
                    metrics.set_index_rows(rows);
                }
            }
            Entry::Occupied(mut occupied) => {
                if occupied.get_mut().insert(doc_id) == RowInsert::Upgraded {
                    debug!(key = %occupied.key(), doc_id, "upgraded legacy index row");
                    if let Some(metrics) = &self.metrics {
                        metrics.record_upgrade();
                    }
                }
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_insert(token.folded);
        }
    }

    /// Store a pre-migration single-value row, as older releases wrote them.
    ///
    /// Counts as a row creation; an existing row is left untouched.
    pub fn insert_legacy_row(&self, token: impl AsRef<[u8]>, doc_id: DocumentId) -> bool {
        let key = normalize_token(token.as_ref()).key.into_owned();
        match self.rows.entry(key) {
            Entry::Vacant(vacant) => {
                vacant.insert(IndexRow::Single(doc_id));
                self.length.fetch_add(1, Ordering::SeqCst);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Document ids stored under `token`, ascending
    pub fn get(&self, token: impl AsRef<[u8]>) -> Option<Vec<DocumentId>> {
        let token = normalize_token(token.as_ref());
        self.rows.get(&*token.key).map(|row| row.ids())
    }

    pub fn row(&self, token: impl AsRef<[u8]>) -> Option<IndexRow> {
        let token = normalize_token(token.as_ref());
        self.rows.get(&*token.key).map(|row| row.value().clone())
    }

    pub fn contains(&self, token: impl AsRef<[u8]>, doc_id: DocumentId) -> bool {
        let token = normalize_token(token.as_ref());
        self.rows
            .get(&*token.key)
            .map(|row| row.contains(doc_id))
            .unwrap_or(false)
    }

    /// Number of rows ever created
    pub fn row_count(&self) -> u64 {
        self.length.load(Ordering::SeqCst)
    }

    /// Number of rows currently stored
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total number of (token, document id) pairs
    pub fn posting_count(&self) -> usize {
        self.rows.iter().map(|row| row.len()).sum()
    }

    /// Stored tokens in sorted order
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.rows.iter().map(|row| row.key().clone()).collect();
        tokens.sort();
        tokens
    }

    /// Copy the index into a snapshot.
    ///
    /// Not a point-in-time view while inserts run concurrently.
    pub fn snapshot(&self) -> IndexSnapshot {
        let rows: BTreeMap<String, IndexRow> = self
            .rows
            .iter()
            .map(|row| (row.key().clone(), row.value().clone()))
            .collect();
        IndexSnapshot::new(rows, self.row_count())
    }

    pub fn from_snapshot(snapshot: IndexSnapshot, settings: &IndexSettings) -> Result<Self> {
        if !snapshot.is_compatible() {
            return Err(LdapdexError::IncompatibleSnapshot {
                expected: SNAPSHOT_VERSION,
                actual: snapshot.version,
            });
        }

        let index = Self::new(settings);
        let legacy = snapshot.legacy_rows();
        for (token, row) in snapshot.rows {
            index.rows.insert(token, row);
        }
        index.length.store(snapshot.length, Ordering::SeqCst);
        debug!(
            rows = index.len(),
            legacy,
            length = snapshot.length,
            "restored posting index"
        );
        Ok(index)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.snapshot().to_bytes()?;
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load_from(path: impl AsRef<Path>, settings: &IndexSettings) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_snapshot(IndexSnapshot::from_bytes(&bytes)?, settings)
    }
}

impl Default for PostingIndex {
    fn default() -> Self {
        Self::new(&IndexSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn index() -> PostingIndex {
        PostingIndex::new(&IndexSettings::default().with_shard_amount(4))
    }

    #[test]
    fn test_duplicate_insert_is_noop() {
        let index = index();
        index.insert("ops", 1);
        index.insert("ops", 1);

        assert_eq!(index.get("ops"), Some(vec![1]));
        assert_eq!(index.row_count(), 1);
    }

    #[test]
    fn test_counter_tracks_rows_not_postings() {
        let index = index();
        index.insert("ops", 1);
        index.insert("ops", 2);
        assert_eq!(index.row_count(), 1);
        assert_eq!(index.posting_count(), 2);

        index.insert("dev", 2);
        assert_eq!(index.row_count(), 2);
        assert_eq!(index.tokens(), vec!["dev", "ops"]);
    }

    #[test]
    fn test_legacy_row_upgrade_keeps_counter() {
        let index = index();
        assert!(index.insert_legacy_row("ops", 5));
        assert!(!index.insert_legacy_row("ops", 6));
        let before = index.row_count();

        index.insert("ops", 9);
        assert_eq!(index.row("ops"), Some(IndexRow::Set(BTreeSet::from([5, 9]))));
        assert_eq!(index.row_count(), before);
    }

    #[test]
    fn test_non_utf8_token_is_insertable() {
        let index = index();
        let raw: &[u8] = b"cr\xe8me";
        index.insert(raw, 1);
        index.insert(raw, 2);

        assert_eq!(index.len(), 1);
        assert_eq!(index.get(raw), Some(vec![1, 2]));
        assert_eq!(index.tokens(), vec!["crme"]);
        assert!(index.contains("crme", 2));
    }

    #[test]
    fn test_snapshot_restores_counter_and_rows() {
        let index = index();
        index.insert("ops", 1);
        index.insert_legacy_row("old", 3);

        let restored =
            PostingIndex::from_snapshot(index.snapshot(), &IndexSettings::default()).unwrap();
        assert_eq!(restored.row_count(), 2);
        assert_eq!(restored.row("old"), Some(IndexRow::Single(3)));

        restored.insert("old", 4);
        assert_eq!(restored.get("old"), Some(vec![3, 4]));
        assert_eq!(restored.row_count(), 2);
    }

    #[test]
    fn test_incompatible_snapshot_is_rejected() {
        let mut snapshot = index().snapshot();
        snapshot.version = SNAPSHOT_VERSION + 1;
        let err = PostingIndex::from_snapshot(snapshot, &IndexSettings::default())
            .err()
            .unwrap();
        assert!(matches!(err, LdapdexError::IncompatibleSnapshot { .. }));
    }

    #[test]
    fn test_metrics_follow_inserts() {
        let metrics = LdapdexMetrics::new().unwrap();
        let index = index().with_metrics(metrics.clone());
        index.insert_legacy_row("old", 1);
        index.insert("old", 2);
        index.insert(&b"\xff"[..], 3);

        assert_eq!(metrics.postings_inserted.get(), 2.0);
        assert_eq!(metrics.legacy_rows_upgraded.get(), 1.0);
        assert_eq!(metrics.tokens_folded.get(), 1.0);
        assert_eq!(metrics.index_rows.get(), 2.0);
    }
}
