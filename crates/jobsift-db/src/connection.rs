//! Database connection management.
//!
//! Opens a `SQLite` connection pool with create-if-missing semantics. The
//! store is single-writer per process; the URL uniqueness constraint is
//! the only cross-process safety net.

use crate::error::{DatabaseError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

/// Open a connection pool at the given path (or `:memory:`).
///
/// The database file is created if it does not exist.
pub async fn open_pool(path: &str) -> Result<Pool<Sqlite>> {
    let connect_options = SqliteConnectOptions::from_str(path)
        .map_err(|e| DatabaseError::Open(format!("invalid connection string: {e}")))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await
        .map_err(|e| DatabaseError::Open(format!("failed to connect: {e}")))?;

    tracing::info!("database pool opened at {}", path);

    Ok(pool)
}
