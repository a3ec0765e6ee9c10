//! Transient in-memory backend
//!
//! Same contracts and error semantics as the other backends, nothing
//! persisted. Useful for tests and for trying the application out.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use crate::models::{ListRecord, MediaEntity};
use crate::storage::contract::{EntityStore, ListStore, MembershipStore};
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::list_index::ListIndex;

/// Lock a mutex, continuing past poisoning
///
/// Every write below is a single map operation, so a panic elsewhere
/// cannot leave a half-applied update behind.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory entity store
pub struct MemoryEntityStore<E: MediaEntity> {
    // Vec keeps insertion order for retrieve_all
    entities: Mutex<(HashMap<i64, usize>, Vec<E>)>,
}

impl<E: MediaEntity> Default for MemoryEntityStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: MediaEntity> MemoryEntityStore<E> {
    pub fn new() -> Self {
        Self {
            entities: Mutex::new((HashMap::new(), Vec::new())),
        }
    }
}

impl<E: MediaEntity> EntityStore<E> for MemoryEntityStore<E> {
    fn retrieve_by_id(&self, id: i64) -> StoreResult<E> {
        let guard = lock(&self.entities);
        let (index, entities) = &*guard;
        index
            .get(&id)
            .map(|&pos| entities[pos].clone())
            .ok_or(StoreError::NotFound {
                record: E::KIND.label(),
                id,
            })
    }

    fn save(&self, entity: &E) -> StoreResult<()> {
        let mut guard = lock(&self.entities);
        let (index, entities) = &mut *guard;
        if index.contains_key(&entity.id()) {
            return Err(StoreError::DuplicateId {
                record: E::KIND.label(),
                id: entity.id(),
            });
        }
        index.insert(entity.id(), entities.len());
        entities.push(entity.clone());
        Ok(())
    }

    fn retrieve_all(&self) -> StoreResult<Vec<E>> {
        Ok(lock(&self.entities).1.clone())
    }
}

/// In-memory list store with owner index
#[derive(Default)]
pub struct MemoryListStore {
    index: Mutex<ListIndex>,
}

impl MemoryListStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ListStore for MemoryListStore {
    fn retrieve_by_id(&self, id: i64) -> StoreResult<ListRecord> {
        lock(&self.index)
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound { record: "list", id })
    }

    fn save(&self, list: &ListRecord) -> StoreResult<()> {
        if list.owner.trim().is_empty() {
            return Err(StoreError::InvalidField {
                field: "owner",
                details: "must not be empty".to_string(),
            });
        }
        if !lock(&self.index).insert(list.clone()) {
            return Err(StoreError::DuplicateId {
                record: "list",
                id: list.id,
            });
        }
        Ok(())
    }

    fn delete(&self, id: i64) -> StoreResult<()> {
        lock(&self.index)
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound { record: "list", id })
    }

    fn retrieve_all_owned_by(&self, username: &str) -> StoreResult<Vec<ListRecord>> {
        Ok(lock(&self.index).owned_by(username))
    }
}

/// In-memory membership store
pub struct MemoryMembershipStore<E: MediaEntity> {
    entities: Arc<dyn EntityStore<E>>,
    // list id -> member ids in insertion order
    members: Mutex<HashMap<i64, Vec<i64>>>,
}

impl<E: MediaEntity> MemoryMembershipStore<E> {
    pub fn new(entities: Arc<dyn EntityStore<E>>) -> Self {
        Self {
            entities,
            members: Mutex::new(HashMap::new()),
        }
    }
}

impl<E: MediaEntity> MembershipStore<E> for MemoryMembershipStore<E> {
    fn add(&self, list_id: i64, entity_id: i64) -> StoreResult<()> {
        let mut members = lock(&self.members);
        let ids = members.entry(list_id).or_default();
        if ids.contains(&entity_id) {
            return Err(StoreError::AlreadyMember {
                kind: E::KIND,
                list_id,
                entity_id,
            });
        }
        ids.push(entity_id);
        Ok(())
    }

    fn remove(&self, list_id: i64, entity_id: i64) -> StoreResult<()> {
        let not_member = || StoreError::NotMember {
            kind: E::KIND,
            list_id,
            entity_id,
        };

        let mut members = lock(&self.members);
        let Some(ids) = members.get_mut(&list_id) else {
            return Err(not_member());
        };
        let Some(pos) = ids.iter().position(|&id| id == entity_id) else {
            return Err(not_member());
        };

        ids.remove(pos);
        if ids.is_empty() {
            members.remove(&list_id);
        }
        Ok(())
    }

    fn remove_all(&self, list_id: i64) -> StoreResult<()> {
        lock(&self.members).remove(&list_id);
        Ok(())
    }

    fn list_members(&self, list_id: i64) -> StoreResult<Vec<E>> {
        let ids = lock(&self.members)
            .get(&list_id)
            .cloned()
            .unwrap_or_default();

        let mut result = Vec::with_capacity(ids.len());
        for id in ids {
            match self.entities.retrieve_by_id(id) {
                Ok(entity) => result.push(entity),
                Err(StoreError::NotFound { .. }) => {
                    warn!("List {} references missing {} {}", list_id, E::KIND, id)
                }
                Err(e) => return Err(e),
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Anime;

    #[test]
    fn test_entity_store_preserves_insertion_order() {
        let store: MemoryEntityStore<Anime> = MemoryEntityStore::new();
        store.save(&Anime::new(9, "Later id first", 12)).unwrap();
        store.save(&Anime::new(1, "Earlier id second", 24)).unwrap();

        let ids: Vec<i64> = store.retrieve_all().unwrap().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![9, 1]);
        assert!(store.save(&Anime::new(1, "Dup", 1)).is_err());
    }

    #[test]
    fn test_list_store_rejects_empty_owner() {
        let store = MemoryListStore::new();
        let err = store.save(&ListRecord::new(1, "A", "  ")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidField { field: "owner", .. }));
    }

    #[test]
    fn test_membership_state_transitions() {
        let entities: Arc<MemoryEntityStore<Anime>> = Arc::new(MemoryEntityStore::new());
        entities.save(&Anime::new(3, "Show", 12)).unwrap();
        let members = MemoryMembershipStore::new(entities as Arc<dyn EntityStore<Anime>>);

        members.add(1, 3).unwrap();
        assert!(members.add(1, 3).is_err());
        assert_eq!(members.list_members(1).unwrap().len(), 1);

        members.remove(1, 3).unwrap();
        assert!(matches!(
            members.remove(1, 3).unwrap_err(),
            StoreError::NotMember { .. }
        ));
        assert!(members.list_members(1).unwrap().is_empty());
    }
}
