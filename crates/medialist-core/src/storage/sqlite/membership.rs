//! SQLite membership store, one `list_<kind>` join table per kind

use std::marker::PhantomData;

use rusqlite::params;
use tracing::warn;

use crate::models::MediaEntity;
use crate::storage::contract::MembershipStore;
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::sqlite::connection::ConnectionPool;
use crate::storage::sqlite::schema::entity_columns;
use crate::storage::sqlite::{constraint_of, Constraint};

pub struct SqliteMembershipStore<E: MediaEntity> {
    pool: ConnectionPool,
    insert: String,
    delete_one: String,
    delete_all: String,
    select_members: String,
    _kind: PhantomData<E>,
}

impl<E: MediaEntity> SqliteMembershipStore<E> {
    pub fn new(pool: ConnectionPool) -> Self {
        let join = E::KIND.join_table();
        let column = E::KIND.join_column();
        let (table, first, second) = entity_columns(E::KIND);
        Self {
            pool,
            insert: format!("INSERT INTO {join} (idList, {column}) VALUES (?1, ?2)"),
            delete_one: format!("DELETE FROM {join} WHERE idList = ?1 AND {column} = ?2"),
            delete_all: format!("DELETE FROM {join} WHERE idList = ?1"),
            // LEFT JOIN so dangling ids can be reported
            select_members: format!(
                "SELECT j.{column}, e.id, e.{first}, e.{second}, e.title
                 FROM {join} j LEFT JOIN {table} e ON e.id = j.{column}
                 WHERE j.idList = ?1
                 ORDER BY j.rowid"
            ),
            _kind: PhantomData,
        }
    }
}

impl<E: MediaEntity> MembershipStore<E> for SqliteMembershipStore<E> {
    fn add(&self, list_id: i64, entity_id: i64) -> StoreResult<()> {
        let conn = self.pool.get()?;
        match conn.execute(&self.insert, params![list_id, entity_id]) {
            Ok(_) => Ok(()),
            Err(e) => match constraint_of(&e) {
                Some(Constraint::Unique) => Err(StoreError::AlreadyMember {
                    kind: E::KIND,
                    list_id,
                    entity_id,
                }),
                Some(Constraint::ForeignKey) => Err(StoreError::NotFound {
                    record: "list",
                    id: list_id,
                }),
                _ => Err(e.into()),
            },
        }
    }

    fn remove(&self, list_id: i64, entity_id: i64) -> StoreResult<()> {
        let conn = self.pool.get()?;
        let deleted = conn.execute(&self.delete_one, params![list_id, entity_id])?;
        if deleted == 0 {
            return Err(StoreError::NotMember {
                kind: E::KIND,
                list_id,
                entity_id,
            });
        }
        Ok(())
    }

    fn remove_all(&self, list_id: i64) -> StoreResult<()> {
        let conn = self.pool.get()?;
        conn.execute(&self.delete_all, params![list_id])?;
        Ok(())
    }

    fn list_members(&self, list_id: i64) -> StoreResult<Vec<E>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&self.select_members)?;
        let rows = stmt.query_map(params![list_id], |row| {
            let member_id: i64 = row.get(0)?;
            let found: Option<i64> = row.get(1)?;
            let entity = match found {
                Some(id) => Some(E::from_parts(id, row.get(2)?, row.get(3)?, row.get(4)?)),
                None => None,
            };
            Ok((member_id, entity))
        })?;

        let mut members = Vec::new();
        for row in rows {
            match row? {
                (_, Some(entity)) => members.push(entity),
                (id, None) => warn!(
                    "List {} references missing {} {}, skipping",
                    list_id,
                    E::KIND,
                    id
                ),
            }
        }
        Ok(members)
    }
}
