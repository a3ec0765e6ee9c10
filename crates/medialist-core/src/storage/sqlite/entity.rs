//! SQLite entity store, one table per media kind

use std::marker::PhantomData;

use rusqlite::{params, OptionalExtension, Row};

use crate::models::MediaEntity;
use crate::storage::contract::EntityStore;
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::sqlite::connection::ConnectionPool;
use crate::storage::sqlite::schema::entity_columns;
use crate::storage::sqlite::{constraint_of, Constraint};

pub struct SqliteEntityStore<E: MediaEntity> {
    pool: ConnectionPool,
    select_one: String,
    select_all: String,
    insert: String,
    _kind: PhantomData<E>,
}

impl<E: MediaEntity> SqliteEntityStore<E> {
    pub fn new(pool: ConnectionPool) -> Self {
        let (table, first, second) = entity_columns(E::KIND);
        Self {
            pool,
            select_one: format!(
                "SELECT id, {first}, {second}, title FROM {table} WHERE id = ?1"
            ),
            select_all: format!("SELECT id, {first}, {second}, title FROM {table} ORDER BY id"),
            insert: format!(
                "INSERT INTO {table} (id, {first}, {second}, title) VALUES (?1, ?2, ?3, ?4)"
            ),
            _kind: PhantomData,
        }
    }

    fn row_to_entity(row: &Row) -> Result<E, rusqlite::Error> {
        Ok(E::from_parts(row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    }
}

impl<E: MediaEntity> EntityStore<E> for SqliteEntityStore<E> {
    fn retrieve_by_id(&self, id: i64) -> StoreResult<E> {
        let conn = self.pool.get()?;
        conn.query_row(&self.select_one, params![id], Self::row_to_entity)
            .optional()?
            .ok_or(StoreError::NotFound {
                record: E::KIND.label(),
                id,
            })
    }

    fn save(&self, entity: &E) -> StoreResult<()> {
        let conn = self.pool.get()?;
        let (first, second) = entity.attributes();
        match conn.execute(
            &self.insert,
            params![entity.id(), first, second, entity.title()],
        ) {
            Ok(_) => Ok(()),
            Err(e) if constraint_of(&e) == Some(Constraint::Unique) => {
                Err(StoreError::DuplicateId {
                    record: E::KIND.label(),
                    id: entity.id(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn retrieve_all(&self) -> StoreResult<Vec<E>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&self.select_all)?;
        let entities = stmt
            .query_map([], Self::row_to_entity)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Anime, Movie};
    use crate::storage::sqlite::connection::open_memory_pool;

    #[test]
    fn test_save_and_retrieve() {
        let store: SqliteEntityStore<Movie> = SqliteEntityStore::new(open_memory_pool().unwrap());
        let movie = Movie::new(42, "Film A", 120).with_release_year(1999);

        store.save(&movie).unwrap();

        assert_eq!(store.retrieve_by_id(42).unwrap(), movie);
        assert!(store.retrieve_by_id(43).unwrap_err().is_not_found());
    }

    #[test]
    fn test_duplicate_is_reported() {
        let store: SqliteEntityStore<Anime> = SqliteEntityStore::new(open_memory_pool().unwrap());
        store.save(&Anime::new(1, "A", 12)).unwrap();

        let err = store.save(&Anime::new(1, "B", 24)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::DuplicateId {
                record: "anime",
                id: 1
            }
        ));
        assert_eq!(store.retrieve_all().unwrap().len(), 1);
    }
}
