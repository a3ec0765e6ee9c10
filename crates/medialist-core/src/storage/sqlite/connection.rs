//! Database connection management
//!
//! Stores receive a pool handle at construction and check out a
//! connection per call. The pool validates connections on checkout, so
//! there is no shared connection to go stale.

use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::storage::error::{StoreError, StoreResult};
use crate::storage::sqlite::schema::{init_schema, needs_init};

/// Type alias for connection pool
pub type ConnectionPool = Pool<SqliteConnectionManager>;

const PRAGMAS: &str = "PRAGMA foreign_keys = ON;
     PRAGMA busy_timeout = 5000;";

/// Open a pool on a database file, creating and migrating it if needed
///
/// - Foreign keys enabled (needed for cascading list deletes)
/// - WAL journal for concurrent readers
/// - Busy timeout so writers wait instead of failing immediately
pub fn open_pool(path: &Path, max_size: u32) -> StoreResult<ConnectionPool> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.execute_batch(PRAGMAS)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))
    });

    let pool = Pool::builder().max_size(max_size.max(1)).build(manager)?;
    prepare_schema(&pool)?;
    info!("Opened SQLite pool at {:?} (max {} connections)", path, max_size);
    Ok(pool)
}

/// Open a single-connection pool on a private in-memory database
///
/// Each in-memory connection is its own database, so the pool is capped
/// at one connection.
pub fn open_memory_pool() -> StoreResult<ConnectionPool> {
    let manager =
        SqliteConnectionManager::memory().with_init(|conn| conn.execute_batch(PRAGMAS));
    let pool = Pool::builder().max_size(1).build(manager)?;
    prepare_schema(&pool)?;
    Ok(pool)
}

fn prepare_schema(pool: &ConnectionPool) -> StoreResult<()> {
    let conn = pool.get()?;
    if needs_init(&conn) {
        init_schema(&conn)?;
    }
    Ok(())
}
