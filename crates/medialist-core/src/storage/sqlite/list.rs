//! SQLite list store

use rusqlite::{params, OptionalExtension, Row};

use crate::models::ListRecord;
use crate::storage::contract::ListStore;
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::sqlite::connection::ConnectionPool;
use crate::storage::sqlite::{constraint_of, Constraint};

pub struct SqliteListStore {
    pool: ConnectionPool,
}

impl SqliteListStore {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    fn row_to_list(row: &Row) -> Result<ListRecord, rusqlite::Error> {
        Ok(ListRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            owner: row.get(2)?,
        })
    }
}

impl ListStore for SqliteListStore {
    fn retrieve_by_id(&self, id: i64) -> StoreResult<ListRecord> {
        let conn = self.pool.get()?;
        conn.query_row(
            "SELECT id, name, owner FROM list WHERE id = ?1",
            params![id],
            Self::row_to_list,
        )
        .optional()?
        .ok_or(StoreError::NotFound { record: "list", id })
    }

    fn save(&self, list: &ListRecord) -> StoreResult<()> {
        if list.owner.trim().is_empty() {
            return Err(StoreError::InvalidField {
                field: "owner",
                details: "must not be empty".to_string(),
            });
        }

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO user (username) VALUES (?1)",
            params![list.owner],
        )?;
        match tx.execute(
            "INSERT INTO list (id, name, owner) VALUES (?1, ?2, ?3)",
            params![list.id, list.name, list.owner],
        ) {
            Ok(_) => {}
            Err(e) if constraint_of(&e) == Some(Constraint::Unique) => {
                return Err(StoreError::DuplicateId {
                    record: "list",
                    id: list.id,
                });
            }
            Err(e) => return Err(e.into()),
        }
        tx.commit()?;
        Ok(())
    }

    fn delete(&self, id: i64) -> StoreResult<()> {
        let conn = self.pool.get()?;
        // Join rows go with it via ON DELETE CASCADE
        let deleted = conn.execute("DELETE FROM list WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound { record: "list", id });
        }
        Ok(())
    }

    fn retrieve_all_owned_by(&self, username: &str) -> StoreResult<Vec<ListRecord>> {
        let conn = self.pool.get()?;
        let mut stmt =
            conn.prepare("SELECT id, name, owner FROM list WHERE owner = ?1 ORDER BY id")?;
        let lists = stmt
            .query_map(params![username], Self::row_to_list)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lists)
    }
}
