//! Flat-file list store
//!
//! One `id,name,owner` line per list. The cache is a [`ListIndex`], so
//! once it has been filled from a full scan, owner queries are answered
//! from memory.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::models::ListRecord;
use crate::storage::cache::LocalCache;
use crate::storage::contract::ListStore;
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::file::io::{append_line, read_lines, rewrite_filtered};
use crate::storage::file::record::RecordFormat;
use crate::storage::list_index::ListIndex;

/// List store backed by a delimited file
pub struct FileListStore {
    path: PathBuf,
    format: RecordFormat,
    cache: LocalCache<ListIndex>,
}

impl FileListStore {
    pub fn new(path: impl Into<PathBuf>, format: RecordFormat) -> Self {
        Self {
            path: path.into(),
            format,
            cache: LocalCache::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn scan_for(&self, id: i64) -> StoreResult<Option<ListRecord>> {
        for line in read_lines(&self.path)? {
            if self.format.leading_id(&line.lossy()) != Some(id) {
                continue;
            }
            return line
                .text()
                .and_then(|text| self.format.decode_list(text))
                .map(Some)
                .map_err(|details| StoreError::DataCorruption {
                    path: self.path.clone(),
                    line: line.number,
                    details,
                });
        }
        Ok(None)
    }

    /// Decode every well-formed line, skipping the rest
    fn scan_all(&self) -> StoreResult<Vec<ListRecord>> {
        let mut lists = Vec::new();
        for line in read_lines(&self.path)? {
            match line.text().and_then(|text| self.format.decode_list(text)) {
                Ok(list) => lists.push(list),
                Err(details) => warn!(
                    "Skipping malformed list record at {:?} line {}: {}",
                    self.path, line.number, details
                ),
            }
        }
        Ok(lists)
    }
}

impl ListStore for FileListStore {
    fn retrieve_by_id(&self, id: i64) -> StoreResult<ListRecord> {
        let mut cache = self.cache.lock();
        if let Some(list) = cache.get(id) {
            return Ok(list.clone());
        }

        match self.scan_for(id)? {
            Some(list) => {
                cache.insert(list.clone());
                Ok(list)
            }
            None => Err(StoreError::NotFound { record: "list", id }),
        }
    }

    fn save(&self, list: &ListRecord) -> StoreResult<()> {
        let line = self.format.encode_list(list)?;

        let mut cache = self.cache.lock();
        let taken = cache.contains(list.id)
            || read_lines(&self.path)?
                .iter()
                .any(|line| self.format.leading_id(&line.lossy()) == Some(list.id));
        if taken {
            return Err(StoreError::DuplicateId {
                record: "list",
                id: list.id,
            });
        }

        append_line(&self.path, &line)?;
        cache.insert(list.clone());
        debug!("Saved list {} for {}", list.id, list.owner);
        Ok(())
    }

    fn delete(&self, id: i64) -> StoreResult<()> {
        let mut cache = self.cache.lock();

        let removed = rewrite_filtered(&self.path, |line| {
            self.format.leading_id(line) != Some(id)
        })?;

        // Keep the cache in step with the file either way
        cache.remove(id);

        if removed == 0 {
            return Err(StoreError::NotFound { record: "list", id });
        }
        debug!("Deleted list {}", id);
        Ok(())
    }

    fn retrieve_all_owned_by(&self, username: &str) -> StoreResult<Vec<ListRecord>> {
        let mut cache = self.cache.lock();
        if !cache.is_warm() {
            let lists = self.scan_all()?;
            cache.replace(ListIndex::from_records(lists));
        }
        Ok(cache.owned_by(username))
    }
}
