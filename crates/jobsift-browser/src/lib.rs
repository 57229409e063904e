//! Browser automation driver for JavaScript-heavy, challenge-guarded sites.
//!
//! Provides headless Chromium control behind the [`Driver`] capability
//! trait, with fingerprint randomization for anti-detection. The crawler
//! only depends on the trait, so tests can substitute a scripted fake.

pub mod driver;
pub mod engine;
pub mod error;
pub mod fingerprint;

pub use driver::Driver;
pub use engine::BrowserEngine;
pub use error::{BrowserError, Result};
pub use fingerprint::FingerprintConfig;
