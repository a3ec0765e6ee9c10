//! Flat-file entity store
//!
//! One file per media kind, one `id,attr1,attr2,title` line per entity.
//! Lookups go through the local cache and fall back to a file scan on a
//! miss. `retrieve_all` rebuilds the cache from a full scan.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::models::MediaEntity;
use crate::storage::cache::LocalCache;
use crate::storage::contract::EntityStore;
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::file::io::{append_line, read_lines};
use crate::storage::file::record::RecordFormat;

/// Entity store backed by a delimited file
pub struct FileEntityStore<E: MediaEntity> {
    path: PathBuf,
    format: RecordFormat,
    cache: LocalCache<HashMap<i64, E>>,
}

impl<E: MediaEntity> FileEntityStore<E> {
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

    /// Find the line for `id` and decode it strictly
    ///
    /// A line whose id matches but whose other fields are malformed is a
    /// hard error here.
    fn scan_for(&self, id: i64) -> StoreResult<Option<E>> {
        for line in read_lines(&self.path)? {
            if self.format.leading_id(&line.lossy()) != Some(id) {
                continue;
            }
            return line
                .text()
                .and_then(|text| self.format.decode_entity(text))
                .map(Some)
                .map_err(|details| StoreError::DataCorruption {
                    path: self.path.clone(),
                    line: line.number,
                    details,
                });
        }
        Ok(None)
    }

    fn file_has_id(&self, id: i64) -> StoreResult<bool> {
        Ok(read_lines(&self.path)?
            .iter()
            .any(|line| self.format.leading_id(&line.lossy()) == Some(id)))
    }
}

impl<E: MediaEntity> EntityStore<E> for FileEntityStore<E> {
    fn retrieve_by_id(&self, id: i64) -> StoreResult<E> {
        let mut cache = self.cache.lock();
        if let Some(entity) = cache.get(&id) {
            debug!("Cache hit for {} {}", E::KIND, id);
            return Ok(entity.clone());
        }

        match self.scan_for(id)? {
            Some(entity) => {
                cache.insert(id, entity.clone());
                Ok(entity)
            }
            None => Err(StoreError::NotFound {
                record: E::KIND.label(),
                id,
            }),
        }
    }

    fn save(&self, entity: &E) -> StoreResult<()> {
        let id = entity.id();
        let line = self.format.encode_entity(entity)?;

        let mut cache = self.cache.lock();
        // The cache may be cold, so a miss still needs the file check
        if cache.contains_key(&id) || self.file_has_id(id)? {
            return Err(StoreError::DuplicateId {
                record: E::KIND.label(),
                id,
            });
        }

        append_line(&self.path, &line)?;
        cache.insert(id, entity.clone());
        debug!("Saved {} {}", E::KIND, id);
        Ok(())
    }

    fn retrieve_all(&self) -> StoreResult<Vec<E>> {
        let mut cache = self.cache.lock();

        let mut entities = Vec::new();
        let mut by_id = HashMap::new();
        for line in read_lines(&self.path)? {
            let entity: E = match line.text().and_then(|text| self.format.decode_entity(text)) {
                Ok(entity) => entity,
                Err(details) => {
                    warn!(
                        "Skipping malformed {} record at {:?} line {}: {}",
                        E::KIND,
                        self.path,
                        line.number,
                        details
                    );
                    continue;
                }
            };
            if by_id.contains_key(&entity.id()) {
                warn!(
                    "Skipping duplicate {} {} at {:?} line {}",
                    E::KIND,
                    entity.id(),
                    self.path,
                    line.number
                );
                continue;
            }
            by_id.insert(entity.id(), entity.clone());
            entities.push(entity);
        }

        cache.replace(by_id);
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Movie, TvSeries};
    use std::fs;
    use tempfile::TempDir;

    fn movie_store(temp_dir: &TempDir) -> FileEntityStore<Movie> {
        FileEntityStore::new(temp_dir.path().join("movies.csv"), RecordFormat::default())
    }

    #[test]
    fn test_save_and_retrieve() {
        let temp_dir = TempDir::new().unwrap();
        let store = movie_store(&temp_dir);

        let movie = Movie::new(42, "Film A", 120);
        store.save(&movie).unwrap();

        assert_eq!(store.retrieve_by_id(42).unwrap(), movie);
        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "42,120,0,Film A\n"
        );
    }

    #[test]
    fn test_retrieve_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = movie_store(&temp_dir);

        let err = store.retrieve_by_id(1).unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound {
                record: "movie",
                id: 1
            }
        ));
    }

    #[test]
    fn test_duplicate_rejected_with_cold_cache() {
        let temp_dir = TempDir::new().unwrap();
        movie_store(&temp_dir)
            .save(&Movie::new(42, "Film A", 120))
            .unwrap();

        // Fresh instance, nothing cached yet
        let store = movie_store(&temp_dir);
        let err = store.save(&Movie::new(42, "Other", 90)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { id: 42, .. }));
        assert_eq!(fs::read_to_string(store.path()).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_lookup_reads_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("series.csv");
        fs::write(&path, "7,2,20,The Show\n").unwrap();

        let store: FileEntityStore<TvSeries> = FileEntityStore::new(path, RecordFormat::default());
        assert_eq!(
            store.retrieve_by_id(7).unwrap(),
            TvSeries::new(7, "The Show", 2, 20)
        );
    }

    #[test]
    fn test_malformed_match_is_hard_error_on_lookup() {
        let temp_dir = TempDir::new().unwrap();
        let store = movie_store(&temp_dir);
        fs::write(store.path(), "1,90,2000,Fine\n2,long,2000,Broken\n").unwrap();

        let err = store.retrieve_by_id(2).unwrap_err();
        assert!(matches!(err, StoreError::DataCorruption { line: 2, .. }));
        assert!(store.retrieve_by_id(1).is_ok());
    }

    #[test]
    fn test_retrieve_all_skips_malformed_records() {
        let temp_dir = TempDir::new().unwrap();
        let store = movie_store(&temp_dir);
        fs::write(
            store.path(),
            "1,90,2000,First\ngarbage\n2,x,2000,Bad\n3,100,2010,Third\n",
        )
        .unwrap();

        let all = store.retrieve_all().unwrap();
        let ids: Vec<i64> = all.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_invalid_utf8_record_is_malformed_not_io_failure() {
        let temp_dir = TempDir::new().unwrap();
        let store = movie_store(&temp_dir);
        fs::write(store.path(), b"1,90,2000,First\n2,95,0,Bad \xff title\n").unwrap();

        let ids: Vec<i64> = store.retrieve_all().unwrap().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1]);

        let err = store.retrieve_by_id(2).unwrap_err();
        assert!(matches!(err, StoreError::DataCorruption { line: 2, .. }), "{err}");
        assert!(matches!(
            store.save(&Movie::new(2, "Again", 90)).unwrap_err(),
            StoreError::DuplicateId { id: 2, .. }
        ));

        store.save(&Movie::new(3, "New", 100)).unwrap();
        assert_eq!(store.retrieve_by_id(3).unwrap().title, "New");
    }

    #[test]
    fn test_retrieve_all_replaces_stale_cache() {
        let temp_dir = TempDir::new().unwrap();
        let store = movie_store(&temp_dir);
        store.save(&Movie::new(1, "Kept", 90)).unwrap();
        store.save(&Movie::new(2, "Removed out of band", 90)).unwrap();

        fs::write(store.path(), "1,90,0,Kept\n").unwrap();

        assert_eq!(store.retrieve_all().unwrap().len(), 1);
        assert!(store.retrieve_by_id(2).unwrap_err().is_not_found());
    }
}
