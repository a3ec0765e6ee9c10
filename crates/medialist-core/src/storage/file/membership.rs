//! Flat-file membership store
//!
//! One `listId,entityId` line per membership, one file per media kind.
//!
//! - `add` checks the file for the pair, then appends. The check always
//!   reads the file, so edits made outside this process are honoured.
//! - `remove` / `remove_all` read every line, drop the matches, and
//!   atomically replace the file. There is never a partially written
//!   file in place.
//! - `list_members` reads member ids (from the cache when that list is
//!   cached) and materializes them through the entity store.
//!
//! The cache holds, per list, the member ids in file order. A list is
//! either fully cached or absent. `add` extends a cached list in place;
//! removals drop the whole cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::MediaEntity;
use crate::storage::cache::LocalCache;
use crate::storage::contract::{EntityStore, MembershipStore};
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::file::io::{append_line, read_lines, rewrite_filtered};
use crate::storage::file::record::RecordFormat;

/// Membership store backed by a delimited file
pub struct FileMembershipStore<E: MediaEntity> {
    path: PathBuf,
    format: RecordFormat,
    entities: Arc<dyn EntityStore<E>>,
    cache: LocalCache<HashMap<i64, Vec<i64>>>,
}

impl<E: MediaEntity> FileMembershipStore<E> {
    pub fn new(
        path: impl Into<PathBuf>,
        format: RecordFormat,
        entities: Arc<dyn EntityStore<E>>,
    ) -> Self {
        Self {
            path: path.into(),
            format,
            entities,
            cache: LocalCache::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode every pair in the file, skipping malformed lines
    fn scan_pairs(&self) -> StoreResult<Vec<(i64, i64)>> {
        let mut pairs = Vec::new();
        for line in read_lines(&self.path)? {
            match line.text().and_then(|text| self.format.decode_membership(text)) {
                Ok(pair) => pairs.push(pair),
                Err(details) => warn!(
                    "Skipping malformed {} membership at {:?} line {}: {}",
                    E::KIND,
                    self.path,
                    line.number,
                    details
                ),
            }
        }
        Ok(pairs)
    }

    /// Whether a line is exactly the given pair
    ///
    /// Malformed lines never match, so removals keep them in place.
    fn line_is(&self, line: &str, list_id: i64, entity_id: i64) -> bool {
        self.format.decode_membership(line) == Ok((list_id, entity_id))
    }

    fn line_in_list(&self, line: &str, list_id: i64) -> bool {
        matches!(self.format.decode_membership(line), Ok((l, _)) if l == list_id)
    }

    /// Member ids of one list, deduplicated, in file order
    fn member_ids(&self, list_id: i64) -> StoreResult<Vec<i64>> {
        let mut cache = self.cache.lock();
        if let Some(ids) = cache.get(&list_id) {
            return Ok(ids.clone());
        }

        let mut ids: Vec<i64> = Vec::new();
        for (l, e) in self.scan_pairs()? {
            if l == list_id && !ids.contains(&e) {
                ids.push(e);
            }
        }
        cache.insert(list_id, ids.clone());
        Ok(ids)
    }
}

impl<E: MediaEntity> MembershipStore<E> for FileMembershipStore<E> {
    fn add(&self, list_id: i64, entity_id: i64) -> StoreResult<()> {
        let mut cache = self.cache.lock();

        let present = self
            .scan_pairs()?
            .into_iter()
            .any(|pair| pair == (list_id, entity_id));
        if present {
            // The pair may have been written outside this store
            cache.remove(&list_id);
            return Err(StoreError::AlreadyMember {
                kind: E::KIND,
                list_id,
                entity_id,
            });
        }

        append_line(&self.path, &self.format.encode_membership(list_id, entity_id))?;
        if let Some(ids) = cache.get_mut(&list_id) {
            ids.push(entity_id);
        }
        debug!("Added {} {} to list {}", E::KIND, entity_id, list_id);
        Ok(())
    }

    fn remove(&self, list_id: i64, entity_id: i64) -> StoreResult<()> {
        let mut cache = self.cache.lock();

        let removed =
            rewrite_filtered(&self.path, |line| !self.line_is(line, list_id, entity_id))?;
        if removed == 0 {
            return Err(StoreError::NotMember {
                kind: E::KIND,
                list_id,
                entity_id,
            });
        }

        cache.invalidate();
        debug!("Removed {} {} from list {}", E::KIND, entity_id, list_id);
        Ok(())
    }

    fn remove_all(&self, list_id: i64) -> StoreResult<()> {
        let mut cache = self.cache.lock();

        let removed = rewrite_filtered(&self.path, |line| !self.line_in_list(line, list_id))?;

        cache.invalidate();
        debug!(
            "Removed {} {} membership(s) from list {}",
            removed,
            E::KIND,
            list_id
        );
        Ok(())
    }

    fn list_members(&self, list_id: i64) -> StoreResult<Vec<E>> {
        let ids = self.member_ids(list_id)?;

        let mut members = Vec::with_capacity(ids.len());
        for id in ids {
            match self.entities.retrieve_by_id(id) {
                Ok(entity) => members.push(entity),
                Err(StoreError::NotFound { .. }) => warn!(
                    "List {} references missing {} {}, skipping",
                    list_id,
                    E::KIND,
                    id
                ),
                Err(StoreError::DataCorruption { path, line, details }) => warn!(
                    "List {} references corrupt {} {} ({:?} line {}: {}), skipping",
                    list_id,
                    E::KIND,
                    id,
                    path,
                    line,
                    details
                ),
                Err(e) => return Err(e),
            }
        }
        Ok(members)
    }
}
