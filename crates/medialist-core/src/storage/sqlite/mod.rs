//! Relational backend (SQLite)
//!
//! Plain parameterized CRUD. Uniqueness, foreign keys and cascading list
//! deletes are enforced by the database; this module only maps SQLite's
//! constraint results onto the shared error kinds.

pub mod connection;
pub mod entity;
pub mod list;
pub mod membership;
pub mod schema;

pub use connection::{open_memory_pool, open_pool, ConnectionPool};
pub use entity::SqliteEntityStore;
pub use list::SqliteListStore;
pub use membership::SqliteMembershipStore;
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};

use rusqlite::ffi;

/// Constraint classes the stores translate into domain errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Constraint {
    /// Primary key or unique index
    Unique,
    ForeignKey,
}

/// Classify a constraint violation, if `error` is one
pub(crate) fn constraint_of(error: &rusqlite::Error) -> Option<Constraint> {
    match error {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ffi::ErrorCode::ConstraintViolation => {
            match err.extended_code {
                ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
                    Some(Constraint::Unique)
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Constraint::ForeignKey),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_constraint_classification() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (id INTEGER PRIMARY KEY);
             CREATE TABLE child (pid INTEGER NOT NULL REFERENCES parent(id), n INTEGER,
                                 PRIMARY KEY (pid, n));
             INSERT INTO parent (id) VALUES (1);
             INSERT INTO child (pid, n) VALUES (1, 1);",
        )
        .unwrap();

        let dup = conn
            .execute("INSERT INTO parent (id) VALUES (1)", [])
            .unwrap_err();
        assert_eq!(constraint_of(&dup), Some(Constraint::Unique));

        let dup_pair = conn
            .execute("INSERT INTO child (pid, n) VALUES (1, 1)", [])
            .unwrap_err();
        assert_eq!(constraint_of(&dup_pair), Some(Constraint::Unique));

        let orphan = conn
            .execute("INSERT INTO child (pid, n) VALUES (2, 1)", [])
            .unwrap_err();
        assert_eq!(constraint_of(&orphan), Some(Constraint::ForeignKey));

        let syntax = conn.execute("INSERT INTO nowhere VALUES (1)", []).unwrap_err();
        assert_eq!(constraint_of(&syntax), None);
    }
}
