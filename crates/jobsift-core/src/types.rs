//! Shared types used across the jobsift crates.
//!
//! This module defines common newtypes that provide type safety and clear
//! domain modeling for crawl targets and search parameters.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype for a crawl target site, validated as an HTTP(S) origin.
///
/// A `SiteId` carries the scheme and host of the job board being crawled
/// (e.g. `https://dk.indeed.com`) with any trailing slash stripped, so it
/// can be joined directly with relative paths extracted from result cards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteId(String);

impl SiteId {
    /// Create a new `SiteId` from an origin string.
    ///
    /// # Errors
    /// Returns error if the string is not an absolute HTTP(S) URL with a host.
    pub fn new(origin: impl Into<String>) -> Result<Self, CoreError> {
        let origin = origin.into();
        let parsed = url::Url::parse(&origin)
            .map_err(|e| CoreError::Validation(format!("invalid site origin '{origin}': {e}")))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(CoreError::Validation(format!(
                "invalid site origin '{origin}': scheme must be http or https"
            )));
        }

        if parsed.host_str().is_none() {
            return Err(CoreError::Validation(format!(
                "invalid site origin '{origin}': no host"
            )));
        }

        Ok(Self(origin.trim_end_matches('/').to_string()))
    }

    /// Get the origin string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the host portion of the origin.
    #[must_use]
    pub fn host(&self) -> String {
        url::Url::parse(&self.0)
            .ok()
            .and_then(|u| u.host_str().map(ToString::to_string))
            .unwrap_or_default()
    }

    /// Join a path extracted from a result card into a fully-qualified URL.
    ///
    /// Paths that are already absolute are returned unchanged.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.0, path)
        }
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The search parameters for one crawl: what to look for and how recent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSpec {
    /// Role text, e.g. "software engineer"
    pub role: String,
    /// Location text, e.g. "Copenhagen"
    pub location: String,
    /// "Posted within" recency window, in days
    pub fromage_days: u32,
}

impl SearchSpec {
    /// Create a new search spec.
    ///
    /// # Errors
    /// Returns error if the role text is empty.
    pub fn new(
        role: impl Into<String>,
        location: impl Into<String>,
        fromage_days: u32,
    ) -> Result<Self, CoreError> {
        let role = role.into();
        if role.trim().is_empty() {
            return Err(CoreError::Validation("search role must not be empty".into()));
        }
        Ok(Self {
            role,
            location: location.into(),
            fromage_days,
        })
    }
}

/// The result count reported by the site for a search.
///
/// The site renders this as display text ("1,234 jobs"), so it is kept as
/// the raw string rather than parsed into a number. A missing indicator is
/// never an error; it degrades to [`ReportedCount::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportedCount {
    /// The raw count text read from the results page
    Known(String),
    /// No count indicator resolved on the page
    Unknown,
}

impl fmt::Display for ReportedCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(s) => write!(f, "{s}"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}
