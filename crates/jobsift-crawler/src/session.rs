//! Crawl session state and the session-level retry loop.
//!
//! A session is one attempt at a complete crawl. Transient faults
//! (navigation, persistence) are retried from a fresh search with a
//! jittered backoff; replays are harmless because listing inserts are
//! idempotent. Fatal faults and the exhausted budget surface immediately.

use crate::error::{CrawlError, Result};
use jobsift_core::{ReportedCount, SearchSpec, SiteId};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// The state of one crawl session against a site.
#[derive(Debug, Clone)]
pub struct CrawlSession {
    /// The site being crawled
    pub site: SiteId,
    /// The search being run
    pub spec: SearchSpec,
    /// The count the site reported for this search, once read
    pub reported_count: ReportedCount,
}

impl CrawlSession {
    /// Start a fresh session for a search.
    #[must_use]
    pub fn new(site: SiteId, spec: SearchSpec) -> Self {
        Self {
            site,
            spec,
            reported_count: ReportedCount::Unknown,
        }
    }
}

/// Run a crawl task up to `max_attempts` times.
///
/// The task receives the 1-based attempt number. Transient errors back off
/// and retry; anything else returns at once. When the budget runs out the
/// last transient error is reported inside
/// [`CrawlError::AllAttemptsExhausted`].
pub async fn run_with_retry<T, F, Fut>(
    mut task: F,
    max_attempts: u32,
    base_delay_ms: u64,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last = String::from("no attempts were made");

    for attempt in 1..=max_attempts {
        match task(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => {
                tracing::warn!("crawl attempt {}/{} failed: {}", attempt, max_attempts, e);
                last = e.to_string();
                if attempt < max_attempts {
                    let delay = backoff_delay(base_delay_ms, attempt);
                    tracing::info!("retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;
                }
            }
            Err(e) => return Err(e),
        }
    }

    Err(CrawlError::AllAttemptsExhausted {
        attempts: max_attempts,
        last,
    })
}

/// Linear backoff with uniform jitter of up to half the base delay.
fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let jitter = rand::thread_rng().gen_range(0..=base_ms / 2);
    Duration::from_millis(base_ms * u64::from(attempt) + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let calls = AtomicU32::new(0);

        let result = run_with_retry(
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(42) }
            },
            3,
            0,
        )
        .await;

        assert_eq!(result.expect("first attempt succeeds"), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_errors_exhaust_the_budget() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = run_with_retry(
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(CrawlError::Navigation("page load timed out".into())) }
            },
            3,
            0,
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3, "exactly max_attempts invocations");
        match result {
            Err(CrawlError::AllAttemptsExhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(last.contains("page load timed out"));
            }
            other => panic!("expected AllAttemptsExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);

        let result = run_with_retry(
            |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(CrawlError::Navigation("flaky".into()))
                    } else {
                        Ok("done")
                    }
                }
            },
            3,
            0,
        )
        .await;

        assert_eq!(result.expect("third attempt succeeds"), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_error_aborts_immediately() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = run_with_retry(
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(CrawlError::Launch("no chrome binary".into())) }
            },
            3,
            0,
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1, "fatal errors are not retried");
        assert!(matches!(result, Err(CrawlError::Launch(_))));
    }

    #[test]
    fn test_backoff_delay_bounds() {
        for attempt in 1..=3 {
            let delay = backoff_delay(100, attempt);
            let base = u64::from(attempt) * 100;
            assert!(delay >= Duration::from_millis(base));
            assert!(delay <= Duration::from_millis(base + 50));
        }
    }
}
