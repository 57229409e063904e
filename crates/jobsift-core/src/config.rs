//! Crawl configuration.
//!
//! Provides a typed configuration value with sensible defaults and
//! environment variable overrides. Loading configuration files is the
//! caller's concern; the crawler only consumes this struct.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for one crawl invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Site origin to crawl, e.g. `https://dk.indeed.com`
    pub site: String,
    /// Role text to search for
    pub role: String,
    /// Location text to search in
    pub location: String,
    /// "Posted within" recency window, in days
    pub fromage_days: u32,
    /// Path to the SQLite database file (`:memory:` for tests)
    pub db_path: String,
    /// Run the browser headless
    pub headless: bool,
    /// Maximum session-level attempts for the whole crawl
    pub max_attempts: u32,
    /// Base delay in milliseconds for session retry backoff (jittered)
    pub retry_delay_ms: u64,
    /// Hard ceiling on pages visited in one crawl
    pub max_pages: u32,
    /// Optional wall-clock deadline for the whole crawl, in seconds
    pub deadline_secs: Option<u64>,
    /// Where to save the post-search screenshot, if anywhere
    pub screenshot_path: Option<PathBuf>,
    /// Bounds for the randomized pause between page steps, in milliseconds
    pub page_pause_ms: (u64, u64),
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            site: "https://dk.indeed.com".to_string(),
            role: "software engineer".to_string(),
            location: "Copenhagen".to_string(),
            fromage_days: 7,
            db_path: "jobsift.db".to_string(),
            headless: true,
            max_attempts: 3,
            retry_delay_ms: 5000,
            max_pages: 100,
            deadline_secs: None,
            screenshot_path: None,
            page_pause_ms: (1000, 3000),
        }
    }
}

impl CrawlConfig {
    /// Apply environment variable overrides to this configuration.
    ///
    /// Supports:
    /// - `JOBSIFT_HEADLESS`: override headless mode (true/false)
    /// - `JOBSIFT_MAX_PAGES`: override the page ceiling
    /// - `JOBSIFT_MAX_ATTEMPTS`: override the session retry budget
    #[must_use]
    pub fn with_env(mut self) -> Self {
        if let Ok(val) = std::env::var("JOBSIFT_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.headless = headless;
                tracing::debug!("Override headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("JOBSIFT_MAX_PAGES") {
            if let Ok(pages) = val.parse() {
                self.max_pages = pages;
                tracing::debug!("Override max_pages from env: {}", pages);
            }
        }

        if let Ok(val) = std::env::var("JOBSIFT_MAX_ATTEMPTS") {
            if let Ok(attempts) = val.parse() {
                self.max_attempts = attempts;
                tracing::debug!("Override max_attempts from env: {}", attempts);
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CrawlConfig::default();
        assert!(config.headless);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.max_pages, 100);
        assert!(config.deadline_secs.is_none());
        assert!(config.page_pause_ms.0 <= config.page_pause_ms.1);
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("JOBSIFT_HEADLESS", "false");
        std::env::set_var("JOBSIFT_MAX_PAGES", "7");
        std::env::set_var("JOBSIFT_MAX_ATTEMPTS", "5");

        let config = CrawlConfig::default().with_env();

        std::env::remove_var("JOBSIFT_HEADLESS");
        std::env::remove_var("JOBSIFT_MAX_PAGES");
        std::env::remove_var("JOBSIFT_MAX_ATTEMPTS");

        assert!(!config.headless);
        assert_eq!(config.max_pages, 7);
        assert_eq!(config.max_attempts, 5);

        // Unparseable values leave the defaults in place
        std::env::set_var("JOBSIFT_MAX_PAGES", "lots");
        let config = CrawlConfig::default().with_env();
        std::env::remove_var("JOBSIFT_MAX_PAGES");
        assert_eq!(config.max_pages, 100);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = CrawlConfig::default();
        let json = serde_json::to_string(&config).expect("serialize config");
        let parsed: CrawlConfig = serde_json::from_str(&json).expect("deserialize config");
        assert_eq!(parsed.site, config.site);
        assert_eq!(parsed.max_pages, config.max_pages);
    }
}
