//! Store contracts
//!
//! Every backend implements these three traits. The rest of the crate is
//! written against them only and never learns which backend is active.

use crate::models::{ListRecord, MediaEntity};
use crate::storage::error::StoreResult;

/// Keyed lookup and insert for one media kind
pub trait EntityStore<E: MediaEntity>: Send + Sync {
    /// Fetch by id, `NotFound` on a miss
    fn retrieve_by_id(&self, id: i64) -> StoreResult<E>;

    /// Insert a new entity, `DuplicateId` if the id is taken
    fn save(&self, entity: &E) -> StoreResult<()>;

    /// Every stored entity, as a materialized snapshot
    fn retrieve_all(&self) -> StoreResult<Vec<E>>;
}

/// Keyed lookup, insert and delete for list metadata
pub trait ListStore: Send + Sync {
    /// Fetch by id, `NotFound` on a miss
    fn retrieve_by_id(&self, id: i64) -> StoreResult<ListRecord>;

    /// Insert a new list for `list.owner`, `DuplicateId` if the id is taken
    fn save(&self, list: &ListRecord) -> StoreResult<()>;

    /// Remove a list, `NotFound` if absent
    ///
    /// Memberships are not touched here; cascading is the caller's job.
    fn delete(&self, id: i64) -> StoreResult<()>;

    /// All lists owned by `username`, ordered by id
    fn retrieve_all_owned_by(&self, username: &str) -> StoreResult<Vec<ListRecord>>;
}

/// Many-to-many association between lists and entities of one kind
///
/// Each `(list_id, entity_id)` pair moves between absent and present.
/// `add` on a present pair and `remove` on an absent one are errors,
/// not no-ops.
pub trait MembershipStore<E: MediaEntity>: Send + Sync {
    /// Record the pair, `AlreadyMember` if present
    fn add(&self, list_id: i64, entity_id: i64) -> StoreResult<()>;

    /// Forget the pair, `NotMember` if absent
    fn remove(&self, list_id: i64, entity_id: i64) -> StoreResult<()>;

    /// Forget every pair of the list; succeeds on an empty list
    fn remove_all(&self, list_id: i64) -> StoreResult<()>;

    /// Entities in the list, skipping ids with no entity record
    fn list_members(&self, list_id: i64) -> StoreResult<Vec<E>>;
}
