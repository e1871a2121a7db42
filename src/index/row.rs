use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::DocumentId;

/// Stored value of one index row.
///
/// Rows written by older releases hold a bare document id; they become a
/// set the first time another id is inserted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexRow {
    Single(DocumentId),
    Set(BTreeSet<DocumentId>),
}

/// What an insert did to an existing row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowInsert {
    Inserted,
    Duplicate,
    /// A `Single` row was replaced by a set
    Upgraded,
}

impl IndexRow {
    pub fn singleton(doc_id: DocumentId) -> Self {
        IndexRow::Set(BTreeSet::from([doc_id]))
    }

    pub fn insert(&mut self, doc_id: DocumentId) -> RowInsert {
        match self {
            IndexRow::Set(ids) => {
                if ids.insert(doc_id) {
                    RowInsert::Inserted
                } else {
                    RowInsert::Duplicate
                }
            }
            IndexRow::Single(old) => {
                *self = IndexRow::Set(BTreeSet::from([*old, doc_id]));
                RowInsert::Upgraded
            }
        }
    }

    pub fn contains(&self, doc_id: DocumentId) -> bool {
        match self {
            IndexRow::Single(id) => *id == doc_id,
            IndexRow::Set(ids) => ids.contains(&doc_id),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexRow::Single(_) => 1,
            IndexRow::Set(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, IndexRow::Single(_))
    }

    /// Document ids in ascending order
    pub fn ids(&self) -> Vec<DocumentId> {
        match self {
            IndexRow::Single(id) => vec![*id],
            IndexRow::Set(ids) => ids.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_semantics() {
        let mut row = IndexRow::singleton(1);
        assert_eq!(row.insert(2), RowInsert::Inserted);
        assert_eq!(row.insert(2), RowInsert::Duplicate);
        assert_eq!(row.ids(), vec![1, 2]);
    }

    #[test]
    fn test_single_upgrades_to_set() {
        let mut row = IndexRow::Single(5);
        assert!(row.is_legacy());
        assert_eq!(row.insert(9), RowInsert::Upgraded);
        assert_eq!(row, IndexRow::Set(BTreeSet::from([5, 9])));
        assert!(!row.is_legacy());
    }

    #[test]
    fn test_single_upgrade_with_same_id() {
        let mut row = IndexRow::Single(5);
        row.insert(5);
        assert_eq!(row.ids(), vec![5]);
        assert!(row.contains(5));
    }
}
