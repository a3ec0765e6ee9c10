//! Unified storage interface
//!
//! The `Store` picks one backend when it is opened and wires up one
//! consistent set of stores for it:
//! - a list store
//! - an entity store per media kind
//! - a membership store per media kind
//!
//! Everything above this module talks to `Store` only and never learns
//! which backend is active.
//!
//! ## Usage
//!
//! ```ignore
//! let store = Store::open()?;  // Backend chosen by configuration
//!
//! store.create_list(&ListRecord::new(1, "Favorites", "alice"))?;
//! store.add_to_list(1, &Movie::new(42, "Film A", 120))?;
//!
//! let movies: Vec<Movie> = store.list_members(1)?;
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::{Backend, Config};
use crate::models::{Anime, ListContents, ListRecord, MediaEntity, MediaKind, Movie, TvSeries};
use crate::storage::file::RecordFormat;
use crate::storage::sqlite::{open_memory_pool, open_pool, ConnectionPool};
use crate::storage::{
    EntityStore, FileEntityStore, FileListStore, FileMembershipStore, ListStore,
    MemoryEntityStore, MemoryListStore, MemoryMembershipStore, MembershipStore,
    SqliteEntityStore, SqliteListStore, SqliteMembershipStore, StoreError, StoreResult,
};

/// The entity and membership stores of one media kind
pub struct MediaStores<E: MediaEntity> {
    pub entities: Arc<dyn EntityStore<E>>,
    pub members: Arc<dyn MembershipStore<E>>,
}

impl<E: MediaEntity> Clone for MediaStores<E> {
    fn clone(&self) -> Self {
        Self {
            entities: Arc::clone(&self.entities),
            members: Arc::clone(&self.members),
        }
    }
}

impl<E: MediaEntity> MediaStores<E> {
    fn memory() -> Self {
        let entities: Arc<dyn EntityStore<E>> = Arc::new(MemoryEntityStore::new());
        let members = Arc::new(MemoryMembershipStore::new(Arc::clone(&entities)));
        Self { entities, members }
    }

    fn file(config: &Config, format: RecordFormat) -> Self {
        let entities: Arc<dyn EntityStore<E>> =
            Arc::new(FileEntityStore::new(config.entity_path(E::KIND), format));
        let members = Arc::new(FileMembershipStore::new(
            config.membership_path(E::KIND),
            format,
            Arc::clone(&entities),
        ));
        Self { entities, members }
    }

    fn sqlite(pool: &ConnectionPool) -> Self {
        Self {
            entities: Arc::new(SqliteEntityStore::new(pool.clone())),
            members: Arc::new(SqliteMembershipStore::new(pool.clone())),
        }
    }
}

/// Routes a media kind to its stores
pub trait HasMediaStores<E: MediaEntity> {
    fn media(&self) -> &MediaStores<E>;
}

/// Unified storage interface for medialist
pub struct Store {
    config: Config,
    lists: Box<dyn ListStore>,
    movies: MediaStores<Movie>,
    series: MediaStores<TvSeries>,
    anime: MediaStores<Anime>,
}

impl HasMediaStores<Movie> for Store {
    fn media(&self) -> &MediaStores<Movie> {
        &self.movies
    }
}

impl HasMediaStores<TvSeries> for Store {
    fn media(&self) -> &MediaStores<TvSeries> {
        &self.series
    }
}

impl HasMediaStores<Anime> for Store {
    fn media(&self) -> &MediaStores<Anime> {
        &self.anime
    }
}

impl Store {
    /// Open the store with configuration from file and environment
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config)
    }

    /// Open the store with a specific configuration
    pub fn open_with_config(config: Config) -> Result<Self> {
        config.validate()?;

        let store = match config.backend {
            Backend::Memory => Self::memory_with_config(config),
            Backend::File => {
                config.ensure_data_dir()?;
                let format = RecordFormat::new(config.delimiter);
                Self {
                    lists: Box::new(FileListStore::new(config.lists_path(), format)),
                    movies: MediaStores::file(&config, format),
                    series: MediaStores::file(&config, format),
                    anime: MediaStores::file(&config, format),
                    config,
                }
            }
            Backend::Sqlite => {
                config.ensure_data_dir()?;
                let pool = open_pool(&config.sqlite_path(), config.pool_size)
                    .context("Failed to open SQLite database")?;
                Self::sqlite_with_pool(config, pool)
            }
        };

        info!(
            "Opened {} store in {:?}",
            store.config.backend, store.config.data_dir
        );
        Ok(store)
    }

    /// A transient store, nothing is persisted
    pub fn in_memory() -> Self {
        let config = Config {
            backend: Backend::Memory,
            ..Config::default()
        };
        Self::memory_with_config(config)
    }

    /// A SQLite store on a private in-memory database
    pub fn in_memory_sqlite() -> Result<Self> {
        let config = Config {
            backend: Backend::Sqlite,
            ..Config::default()
        };
        let pool = open_memory_pool().context("Failed to open in-memory database")?;
        Ok(Self::sqlite_with_pool(config, pool))
    }

    fn memory_with_config(config: Config) -> Self {
        Self {
            config,
            lists: Box::new(MemoryListStore::new()),
            movies: MediaStores::memory(),
            series: MediaStores::memory(),
            anime: MediaStores::memory(),
        }
    }

    fn sqlite_with_pool(config: Config, pool: ConnectionPool) -> Self {
        Self {
            config,
            lists: Box::new(SqliteListStore::new(pool.clone())),
            movies: MediaStores::sqlite(&pool),
            series: MediaStores::sqlite(&pool),
            anime: MediaStores::sqlite(&pool),
        }
    }

    /// Which backend this store was opened with
    pub fn backend(&self) -> Backend {
        self.config.backend
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // ==================== List Operations ====================

    /// Create a new list
    pub fn create_list(&self, list: &ListRecord) -> StoreResult<()> {
        self.lists.save(list)
    }

    /// Get a list by ID
    pub fn get_list(&self, id: i64) -> StoreResult<ListRecord> {
        self.lists.retrieve_by_id(id)
    }

    /// All lists of a user, ordered by id
    pub fn lists_owned_by(&self, owner: &str) -> StoreResult<Vec<ListRecord>> {
        self.lists.retrieve_all_owned_by(owner)
    }

    /// Delete a list together with its memberships of every kind
    pub fn delete_list(&self, id: i64) -> StoreResult<()> {
        self.lists.retrieve_by_id(id)?;
        self.clear_list(id)?;
        self.lists.delete(id)?;
        debug!("Deleted list {}", id);
        Ok(())
    }

    /// Remove every membership of a list, keeping the list itself
    pub fn clear_list(&self, id: i64) -> StoreResult<()> {
        self.movies.members.remove_all(id)?;
        self.series.members.remove_all(id)?;
        self.anime.members.remove_all(id)?;
        Ok(())
    }

    /// A list with its members of every kind
    pub fn list_contents(&self, id: i64) -> StoreResult<ListContents> {
        let list = self.lists.retrieve_by_id(id)?;
        Ok(ListContents {
            list,
            movies: self.movies.members.list_members(id)?,
            series: self.series.members.list_members(id)?,
            anime: self.anime.members.list_members(id)?,
        })
    }

    // ==================== Membership Operations ====================

    /// Add an entity to a list, storing the entity first if it is new
    ///
    /// An entity already stored under the same id is kept as is.
    pub fn add_to_list<E>(&self, list_id: i64, entity: &E) -> StoreResult<()>
    where
        E: MediaEntity,
        Self: HasMediaStores<E>,
    {
        self.lists.retrieve_by_id(list_id)?;
        self.ensure_entity(entity)?;
        HasMediaStores::<E>::media(self)
            .members
            .add(list_id, entity.id())
    }

    /// Remove an entity from a list
    pub fn remove_from_list<E>(&self, list_id: i64, entity_id: i64) -> StoreResult<()>
    where
        E: MediaEntity,
        Self: HasMediaStores<E>,
    {
        HasMediaStores::<E>::media(self)
            .members
            .remove(list_id, entity_id)
    }

    /// Entities of one kind in a list
    pub fn list_members<E>(&self, list_id: i64) -> StoreResult<Vec<E>>
    where
        E: MediaEntity,
        Self: HasMediaStores<E>,
    {
        HasMediaStores::<E>::media(self).members.list_members(list_id)
    }

    // ==================== Catalog Operations ====================

    /// Get a stored entity by ID
    pub fn get_entity<E>(&self, id: i64) -> StoreResult<E>
    where
        E: MediaEntity,
        Self: HasMediaStores<E>,
    {
        HasMediaStores::<E>::media(self).entities.retrieve_by_id(id)
    }

    /// Every stored entity of one kind
    pub fn all_entities<E>(&self) -> StoreResult<Vec<E>>
    where
        E: MediaEntity,
        Self: HasMediaStores<E>,
    {
        HasMediaStores::<E>::media(self).entities.retrieve_all()
    }

    /// Number of stored entities per kind
    pub fn entity_counts(&self) -> StoreResult<Vec<(MediaKind, usize)>> {
        Ok(vec![
            (MediaKind::Movie, self.movies.entities.retrieve_all()?.len()),
            (MediaKind::TvSeries, self.series.entities.retrieve_all()?.len()),
            (MediaKind::Anime, self.anime.entities.retrieve_all()?.len()),
        ])
    }

    fn ensure_entity<E>(&self, entity: &E) -> StoreResult<()>
    where
        E: MediaEntity,
        Self: HasMediaStores<E>,
    {
        let entities = &HasMediaStores::<E>::media(self).entities;
        match entities.retrieve_by_id(entity.id()) {
            Ok(stored) => {
                if stored != *entity {
                    debug!(
                        "{} {} already stored with different fields, keeping stored record",
                        E::KIND,
                        entity.id()
                    );
                }
                Ok(())
            }
            Err(e) if e.is_not_found() => match entities.save(entity) {
                // Lost a race with another writer of the same entity
                Ok(()) | Err(StoreError::DuplicateId { .. }) => Ok(()),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        }
    }
}
