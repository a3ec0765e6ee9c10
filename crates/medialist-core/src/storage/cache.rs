//! Local cache
//!
//! An in-memory mirror of a backing file, owned by one store instance.
//! The cache is a performance layer only; the file stays the source of
//! truth. A cache is `warm` once it has been filled from a full scan and
//! can then answer "not present" without touching the file.
//!
//! The mutex also serializes the owning store's file writes: a store
//! holds the guard for the whole check-then-write sequence.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard};

use tracing::warn;

/// Mutex-guarded cache state
#[derive(Debug, Default)]
pub struct LocalCache<T> {
    state: Mutex<Cached<T>>,
}

/// Cached data plus whether it mirrors the whole file
#[derive(Debug, Default)]
pub struct Cached<T> {
    data: T,
    warm: bool,
}

impl<T: Default> LocalCache<T> {
    /// Create an empty, cold cache
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Cached::default()),
        }
    }

    /// Lock the cache for a read-modify-write
    ///
    /// A poisoned lock means a writer panicked mid-update, so the cached
    /// data can no longer be trusted. It is dropped and the cache goes
    /// cold; the next read repopulates it from the file.
    pub fn lock(&self) -> MutexGuard<'_, Cached<T>> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Cache lock poisoned, discarding cached data");
                let mut guard = poisoned.into_inner();
                guard.invalidate();
                self.state.clear_poison();
                guard
            }
        }
    }
}

impl<T: Default> Cached<T> {
    /// True when the data mirrors the entire backing file
    pub fn is_warm(&self) -> bool {
        self.warm
    }

    /// Replace the contents wholesale after a full scan
    pub fn replace(&mut self, data: T) {
        self.data = data;
        self.warm = true;
    }

    /// Drop everything and go cold
    pub fn invalidate(&mut self) {
        self.data = T::default();
        self.warm = false;
    }
}

impl<T> Deref for Cached<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> DerefMut for Cached<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[test]
    fn test_starts_cold_and_empty() {
        let cache: LocalCache<HashMap<i64, String>> = LocalCache::new();
        let guard = cache.lock();
        assert!(!guard.is_warm());
        assert!(guard.is_empty());
    }

    #[test]
    fn test_replace_discards_previous_entries() {
        let cache: LocalCache<HashMap<i64, String>> = LocalCache::new();
        {
            let mut guard = cache.lock();
            guard.insert(1, "stale".to_string());
            guard.insert(2, "kept".to_string());
        }

        let mut fresh = HashMap::new();
        fresh.insert(2, "kept".to_string());
        cache.lock().replace(fresh);

        let guard = cache.lock();
        assert!(guard.is_warm());
        assert!(!guard.contains_key(&1));
        assert_eq!(guard.get(&2).map(String::as_str), Some("kept"));
    }

    #[test]
    fn test_invalidate_goes_cold() {
        let cache: LocalCache<HashMap<i64, String>> = LocalCache::new();
        cache.lock().replace(HashMap::from([(1, "a".to_string())]));
        cache.lock().invalidate();

        let guard = cache.lock();
        assert!(!guard.is_warm());
        assert!(guard.is_empty());
    }

    #[test]
    fn test_poisoned_lock_is_recovered_cold() {
        let cache: Arc<LocalCache<HashMap<i64, String>>> = Arc::new(LocalCache::new());
        cache.lock().replace(HashMap::from([(1, "a".to_string())]));

        let poisoner = Arc::clone(&cache);
        let result = std::thread::spawn(move || {
            let _guard = poisoner.lock();
            panic!("writer died mid-update");
        })
        .join();
        assert!(result.is_err());

        let guard = cache.lock();
        assert!(!guard.is_warm());
        assert!(guard.is_empty());
    }
}
