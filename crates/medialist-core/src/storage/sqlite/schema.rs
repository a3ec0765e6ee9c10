//! SQLite schema for the relational backend
//!
//! One table per media kind and one `list_<kind>` join table per kind.
//! Deleting a list cascades to its join rows.

use rusqlite::{Connection, Result};

use crate::models::MediaKind;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- List owners
        CREATE TABLE IF NOT EXISTS user (
            username TEXT PRIMARY KEY
        );

        -- List metadata
        CREATE TABLE IF NOT EXISTS list (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            owner TEXT NOT NULL,
            FOREIGN KEY (owner) REFERENCES user(username)
        );

        -- Entities, keyed by external catalog id
        CREATE TABLE IF NOT EXISTS movie (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            runtime INTEGER NOT NULL,
            release_year INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tv_series (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            seasons INTEGER NOT NULL,
            episodes INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS anime (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            episodes INTEGER NOT NULL,
            release_year INTEGER NOT NULL
        );

        -- List membership (many-to-many), one table per kind.
        -- Entity ids are not foreign keys: a membership may outlive
        -- or precede its entity record.
        CREATE TABLE IF NOT EXISTS list_movie (
            idList INTEGER NOT NULL,
            idMovie INTEGER NOT NULL,
            PRIMARY KEY (idList, idMovie),
            FOREIGN KEY (idList) REFERENCES list(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS list_tv_series (
            idList INTEGER NOT NULL,
            idTvSeries INTEGER NOT NULL,
            PRIMARY KEY (idList, idTvSeries),
            FOREIGN KEY (idList) REFERENCES list(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS list_anime (
            idList INTEGER NOT NULL,
            idAnime INTEGER NOT NULL,
            PRIMARY KEY (idList, idAnime),
            FOREIGN KEY (idList) REFERENCES list(id) ON DELETE CASCADE
        );

        -- Owner lookups
        CREATE INDEX IF NOT EXISTS idx_list_owner ON list(owner);
        "#,
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_info WHERE key = 'version'")?;
    let result: Result<String> = stmt.query_row([], |row| row.get(0));

    match result {
        Ok(version_str) => Ok(version_str.parse().ok()),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Check if schema needs initialization
pub fn needs_init(conn: &Connection) -> bool {
    let table_exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_info'")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false);

    if !table_exists {
        return true;
    }

    match get_schema_version(conn) {
        Ok(Some(v)) => v < SCHEMA_VERSION,
        _ => true,
    }
}

/// Entity table columns for a kind: `(table, first attribute, second attribute)`
pub fn entity_columns(kind: MediaKind) -> (&'static str, &'static str, &'static str) {
    let (first, second) = kind.attribute_names();
    (kind.label(), first, second)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn test_init_schema() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables = table_names(&conn);
        for kind in MediaKind::ALL {
            assert!(tables.contains(&kind.label().to_string()));
            assert!(tables.contains(&kind.join_table().to_string()));
        }
        assert!(tables.contains(&"list".to_string()));
        assert!(tables.contains(&"user".to_string()));
    }

    #[test]
    fn test_schema_version() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(needs_init(&conn));

        init_schema(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), Some(SCHEMA_VERSION));
        assert!(!needs_init(&conn));
    }

    #[test]
    fn test_init_is_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
    }

    #[test]
    fn test_join_columns_match_kind_naming() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        for kind in MediaKind::ALL {
            let sql = format!(
                "SELECT idList, {} FROM {} LIMIT 0",
                kind.join_column(),
                kind.join_table()
            );
            conn.prepare(&sql).unwrap();

            let (table, first, second) = entity_columns(kind);
            let sql = format!("SELECT id, title, {}, {} FROM {} LIMIT 0", first, second, table);
            conn.prepare(&sql).unwrap();
        }
    }
}
