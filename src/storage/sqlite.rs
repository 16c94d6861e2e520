use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};
use deadpool_sqlite::{Config, Pool, PoolConfig, Runtime};
use rusqlite::Connection;

/// Apply performance PRAGMAs to a SQLite connection.
pub fn apply_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        PRAGMA temp_store = MEMORY;
        ",
    )
}

/// Create a deadpool-sqlite connection pool for the configured database file.
pub fn create_pool(config: &DatabaseConfig) -> Result<Pool, deadpool_sqlite::CreatePoolError> {
    let mut cfg = Config::new(config.path.clone());
    cfg.pool = Some(PoolConfig::new(config.pool_size));
    cfg.create_pool(Runtime::Tokio1)
}

/// Initialize the pool: get a connection, apply pragmas and ensure the schema exists.
pub async fn init_pool(pool: &Pool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get().await?;
    conn.interact(|conn| {
        apply_pragmas(conn)?;
        crate::storage::schema::initialize(conn)?;
        Ok::<_, rusqlite::Error>(())
    })
    .await??;
    Ok(())
}

/// Run `f` on a pooled connection.
///
/// The connection goes back to the pool when the returned future completes,
/// whether `f` succeeded or not.
pub async fn with_conn<T, F>(pool: &Pool, f: F) -> AppResult<T>
where
    F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let conn = pool
        .get()
        .await
        .map_err(|e| AppError::Internal(format!("pool error: {e}")))?;
    let result = conn.interact(f).await??;
    Ok(result)
}
