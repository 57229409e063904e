//! Listing store operations.
//!
//! This module provides the insert-or-ignore persistence for discovered
//! job listings. The canonical URL is the dedup key: a uniqueness conflict
//! is success-but-not-new, never an error, and rows are never mutated
//! after first insert.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Row, Sqlite};

/// A listing extracted from a result card, ready for persistence.
///
/// The completeness gate lives in the extractor: by the time a value of
/// this type exists, `url` and `title` are both non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewListing {
    /// Canonical URL (site origin + extracted path); the dedup key
    pub url: String,
    /// Listing title
    pub title: String,
    /// Company name, if extracted
    pub company: Option<String>,
    /// Freshness label as rendered by the site ("Posted 3 days ago")
    pub freshness_label: Option<String>,
    /// Location text, if extracted
    pub location: Option<String>,
    /// Origin of the site this listing was found on
    pub source_site: String,
}

/// A stored job listing row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListing {
    /// Row id
    pub id: i64,
    /// Canonical URL
    pub url: String,
    /// Listing title
    pub title: String,
    /// Company name
    pub company: Option<String>,
    /// Freshness label
    pub freshness_label: Option<String>,
    /// Location text
    pub location: Option<String>,
    /// Origin of the source site
    pub source_site: Option<String>,
    /// When this listing was first observed
    pub observed_at: DateTime<Utc>,
}

/// Insert a listing unless its URL is already stored.
///
/// Returns `Ok(true)` if a row was inserted, `Ok(false)` if the URL
/// already existed (first write wins). Accepts any executor so it can run
/// inside a page-scoped transaction.
pub async fn insert_if_absent<'e, E>(executor: E, listing: &NewListing) -> Result<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "INSERT OR IGNORE INTO job_listings (url, title, company, freshness_label, location, source_site)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&listing.url)
    .bind(&listing.title)
    .bind(&listing.company)
    .bind(&listing.freshness_label)
    .bind(&listing.location)
    .bind(&listing.source_site)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Persist one page's worth of listings in a single transaction.
///
/// Commits once per fully processed page, not per record. Returns the
/// number of rows actually inserted; URL collisions are counted as
/// skipped, not failed.
pub async fn persist_page(pool: &Pool<Sqlite>, listings: &[NewListing]) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for listing in listings {
        if insert_if_absent(&mut *tx, listing).await? {
            inserted += 1;
            tracing::debug!(url = %listing.url, title = %listing.title, "inserted listing");
        }
    }

    tx.commit().await?;
    Ok(inserted)
}

/// Total number of stored listings.
pub async fn count_listings(pool: &Pool<Sqlite>) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM job_listings")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Fetch a stored listing by its canonical URL.
pub async fn get_by_url(pool: &Pool<Sqlite>, url: &str) -> Result<Option<JobListing>> {
    let row = sqlx::query(
        "SELECT id, url, title, company, freshness_label, location, source_site, observed_at
         FROM job_listings WHERE url = ?",
    )
    .bind(url)
    .fetch_optional(pool)
    .await?;

    row.map(|row| {
        let observed_at_str: String = row.try_get("observed_at")?;
        let observed_at = DateTime::parse_from_rfc3339(&observed_at_str)
            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

        Ok(JobListing {
            id: row.try_get("id")?,
            url: row.try_get("url")?,
            title: row.try_get("title")?,
            company: row.try_get("company")?,
            freshness_label: row.try_get("freshness_label")?,
            location: row.try_get("location")?,
            source_site: row.try_get("source_site")?,
            observed_at,
        })
    })
    .transpose()
}
