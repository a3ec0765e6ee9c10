//! Id and owner index over list records
//!
//! Shared by the memory list store and the file list store's cache so
//! that "all lists of user U" never needs a full scan.

use std::collections::{BTreeSet, HashMap};

use crate::models::ListRecord;

/// Lists keyed by id, plus owner -> ids
#[derive(Debug, Default, Clone)]
pub struct ListIndex {
    by_id: HashMap<i64, ListRecord>,
    by_owner: HashMap<String, BTreeSet<i64>>,
}

impl ListIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from records, later duplicates ignored
    pub fn from_records(records: impl IntoIterator<Item = ListRecord>) -> Self {
        let mut index = Self::new();
        for record in records {
            index.insert(record);
        }
        index
    }

    pub fn get(&self, id: i64) -> Option<&ListRecord> {
        self.by_id.get(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Insert a record; returns false (and changes nothing) if the id exists
    pub fn insert(&mut self, record: ListRecord) -> bool {
        if self.by_id.contains_key(&record.id) {
            return false;
        }
        self.by_owner
            .entry(record.owner.clone())
            .or_default()
            .insert(record.id);
        self.by_id.insert(record.id, record);
        true
    }

    /// Remove a record from both maps
    ///
    /// When the owner's last list goes, the owner entry goes with it.
    pub fn remove(&mut self, id: i64) -> Option<ListRecord> {
        let record = self.by_id.remove(&id)?;
        if let Some(ids) = self.by_owner.get_mut(&record.owner) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_owner.remove(&record.owner);
            }
        }
        Some(record)
    }

    /// Lists owned by `owner`, ordered by id
    pub fn owned_by(&self, owner: &str) -> Vec<ListRecord> {
        self.by_owner
            .get(owner)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.by_id.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of distinct owners with at least one list
    pub fn owner_count(&self) -> usize {
        self.by_owner.len()
    }
}
