//! Jobsift Core - Foundation crate for the jobsift crawler.
//!
//! This crate provides the shared types, configuration, and error handling
//! that the browser, database, and crawler crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - Typed crawl configuration with environment overrides
//! - [`types`] - Shared newtypes (`SiteId`, `SearchSpec`, `ReportedCount`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::CrawlConfig;
pub use error::{CoreError, Result};
pub use types::{ReportedCount, SearchSpec, SiteId};
