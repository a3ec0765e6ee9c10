//! Storage layer
//!
//! Three interchangeable backends behind one set of contracts:
//!
//! - **memory**: transient maps, nothing persisted
//! - **file**: delimited flat files with a per-store local cache
//! - **sqlite**: relational tables with join tables per media kind
//!
//! The contracts live in [`contract`]; error kinds in [`error`].

pub mod cache;
pub mod contract;
pub mod error;
pub mod file;
pub mod list_index;
pub mod memory;
pub mod sqlite;

pub use cache::LocalCache;
pub use contract::{EntityStore, ListStore, MembershipStore};
pub use error::{StoreError, StoreResult};
pub use file::{FileEntityStore, FileListStore, FileMembershipStore, RecordFormat};
pub use list_index::ListIndex;
pub use memory::{MemoryEntityStore, MemoryListStore, MemoryMembershipStore};
pub use sqlite::{ConnectionPool, SqliteEntityStore, SqliteListStore, SqliteMembershipStore};
