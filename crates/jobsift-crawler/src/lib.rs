//! Jobsift Crawler
//!
//! The crawl engine: submits a job search through a live browser session,
//! survives verification interstitials, walks the paginated results, and
//! persists every complete listing exactly once.
//!
//! # Architecture
//!
//! - **Session**: one retry-able attempt at a complete crawl; transient
//!   faults restart from a fresh search with jittered backoff
//! - **Challenge**: a bounded state machine that detects, interacts with
//!   and waits out verification interstitials; failure is soft
//! - **Extraction**: ordered per-field strategy lists over rendered
//!   markup, with a URL+title completeness gate
//! - **Pagination**: driven purely by the next-page accessibility label
//! - **Persistence**: insert-or-ignore keyed on canonical URL, committed
//!   once per page, so replayed crawls are idempotent
//!
//! # Example
//!
//! ```ignore
//! use jobsift_core::CrawlConfig;
//! use jobsift_crawler::Crawler;
//!
//! let config = CrawlConfig::default().with_env();
//! let summary = Crawler::establish(config).await?.run().await?;
//! println!("{} new listings", summary.new_listings);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]

pub mod challenge;
pub mod crawler;
pub mod error;
pub mod extractor;
pub mod navigator;
pub mod paginator;
pub mod session;
pub mod testing;

// Re-export commonly used types
pub use challenge::{ChallengeResolver, ChallengeTiming, VerificationState};
pub use crawler::{CrawlSummary, Crawler};
pub use error::{CrawlError, Result};
pub use extractor::{extract_page, ExtractedPage};
pub use paginator::NextPage;
pub use session::{run_with_retry, CrawlSession};
