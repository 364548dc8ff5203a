use r2d2_sqlite::SqliteConnectionManager;

use super::store::{StoreError, StoreResult};

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;
pub type DbConn = r2d2::PooledConnection<SqliteConnectionManager>;

pub fn create_pool(database_path: &str) -> StoreResult<DbPool> {
    let manager = build_manager(database_path);
    build_pool(manager, None)
}

/// A single-connection pool, so every checkout sees the same in-memory database
pub fn create_memory_pool() -> StoreResult<DbPool> {
    build_pool(SqliteConnectionManager::memory(), Some(1))
}

fn build_manager(path: &str) -> SqliteConnectionManager {
    SqliteConnectionManager::file(path)
}

fn build_pool(manager: SqliteConnectionManager, max_size: Option<u32>) -> StoreResult<DbPool> {
    let mut builder = r2d2::Pool::builder();
    if let Some(size) = max_size {
        builder = builder.max_size(size).idle_timeout(None).max_lifetime(None);
    }
    builder.build(manager).map_err(StoreError::Pool)
}

pub fn get_connection(pool: &DbPool) -> StoreResult<DbConn> {
    pool.get().map_err(StoreError::Pool)
}
