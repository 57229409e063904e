//! Jobsift Database Layer
//!
//! Provides `SQLite` access for the listing store with embedded,
//! idempotent migrations.
//!
//! # Architecture
//!
//! - **Dedup**: listings are keyed by canonical URL with insert-or-ignore
//!   semantics; a uniqueness conflict is success-but-not-new
//! - **Durability**: the crawler commits once per fully processed page
//! - **Migrations**: SQL migrations are embedded and versioned using `SQLx`
//!
//! # Example
//!
//! ```ignore
//! use jobsift_db::{listings, Database};
//!
//! let db = Database::open("jobsift.db").await?;
//! db.run_migrations().await?;
//! let new = listings::persist_page(db.pool(), &page_records).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod connection;
pub mod error;
pub mod listings;
pub mod migrations;

// Re-export commonly used types
pub use error::{DatabaseError, Result};
pub use listings::{JobListing, NewListing};

/// High-level database interface.
///
/// Wraps the connection pool and handles migration bootstrap.
#[derive(Debug)]
pub struct Database {
    pool: sqlx::Pool<sqlx::Sqlite>,
}

impl Database {
    /// Open the database at the given path, creating it if missing.
    pub async fn open(path: &str) -> Result<Self> {
        let pool = connection::open_pool(path).await?;
        Ok(Self { pool })
    }

    /// Run all pending migrations. Safe to call on every startup.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Sqlite> {
        &self.pool
    }

    /// Close the connection pool gracefully.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("database pool closed");
    }
}
