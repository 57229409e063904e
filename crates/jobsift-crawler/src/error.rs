//! Crawl error taxonomy and transient/fatal classification.

use jobsift_browser::BrowserError;
use jobsift_core::CoreError;
use jobsift_db::DatabaseError;
use thiserror::Error;

/// Result type alias for crawl operations.
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Crawl-level errors.
///
/// The session retry loop keys off [`CrawlError::is_transient`]: navigation
/// and persistence faults are retried from a fresh search, everything else
/// aborts the crawl immediately.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The browser session could not be established. Fatal.
    #[error("session launch failed: {0}")]
    Launch(String),

    /// A navigation or page-interaction fault mid-crawl. Transient.
    #[error("navigation fault: {0}")]
    Navigation(String),

    /// A persistence fault. Transient; inserts are idempotent on replay.
    #[error("persistence fault: {0}")]
    Database(#[from] DatabaseError),

    /// Invalid crawl parameters. Fatal.
    #[error("configuration error: {0}")]
    Config(#[from] CoreError),

    /// Every session attempt failed with a transient error.
    #[error("all {attempts} crawl attempts exhausted, last error: {last}")]
    AllAttemptsExhausted {
        /// How many attempts were made
        attempts: u32,
        /// The last transient error observed
        last: String,
    },
}

impl CrawlError {
    /// Whether the session retry loop should retry after this error.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Navigation(_) | Self::Database(_))
    }
}

impl From<BrowserError> for CrawlError {
    fn from(e: BrowserError) -> Self {
        match e {
            BrowserError::Launch(msg) => Self::Launch(msg),
            other => Self::Navigation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CrawlError::Navigation("timeout".into()).is_transient());
        assert!(!CrawlError::Launch("no chrome binary".into()).is_transient());
        assert!(!CrawlError::AllAttemptsExhausted {
            attempts: 3,
            last: "timeout".into()
        }
        .is_transient());
    }

    #[test]
    fn test_launch_faults_stay_fatal_through_conversion() {
        let err: CrawlError = BrowserError::Launch("no chrome binary".into()).into();
        assert!(matches!(err, CrawlError::Launch(_)));

        let err: CrawlError = BrowserError::Timeout("selector".into()).into();
        assert!(err.is_transient());
    }
}
