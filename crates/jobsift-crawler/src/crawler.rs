//! The crawl orchestrator.
//!
//! Ties the session retry loop, challenge resolution, extraction,
//! pagination and persistence together over any [`Driver`]. One `run`
//! call is one complete crawl: search, walk pages until the site says
//! stop (or a ceiling/deadline does), persist each page, then tear the
//! session down no matter how the crawl ended.

use crate::challenge::{pause, ChallengeResolver, ChallengeTiming, VerificationState};
use crate::error::{CrawlError, Result};
use crate::extractor::extract_page;
use crate::navigator;
use crate::paginator::{self, NextPage};
use crate::session::{run_with_retry, CrawlSession};
use jobsift_browser::{BrowserEngine, Driver};
use jobsift_core::{CrawlConfig, ReportedCount, SearchSpec, SiteId};
use jobsift_db::{listings, Database};
use std::time::{Duration, Instant};

/// What one completed crawl produced.
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    /// Listings inserted that were not already stored
    pub new_listings: u64,
    /// Result pages visited
    pub pages: u32,
    /// Cards dropped by the extraction completeness gate
    pub dropped_cards: u64,
    /// The count the site reported for the search
    pub reported_count: ReportedCount,
    /// Which session attempt produced this summary
    pub attempts: u32,
}

/// Drives one crawl over a [`Driver`] and a listing store.
pub struct Crawler<D: Driver> {
    driver: D,
    db: Database,
    site: SiteId,
    spec: SearchSpec,
    config: CrawlConfig,
    timing: ChallengeTiming,
}

impl Crawler<BrowserEngine> {
    /// Launch a browser session and open the listing store.
    ///
    /// A launch fault is fatal; the session retry loop never retries it.
    pub async fn establish(config: CrawlConfig) -> Result<Self> {
        let engine = BrowserEngine::launch(config.headless).await?;
        let db = Database::open(&config.db_path).await?;
        db.run_migrations().await?;
        Self::new(engine, db, config)
    }
}

impl<D: Driver> Crawler<D> {
    /// Build a crawler over an established driver and store.
    pub fn new(driver: D, db: Database, config: CrawlConfig) -> Result<Self> {
        let site = SiteId::new(config.site.clone())?;
        let spec = SearchSpec::new(config.role.clone(), config.location.clone(), config.fromage_days)?;
        Ok(Self {
            driver,
            db,
            site,
            spec,
            config,
            timing: ChallengeTiming::default(),
        })
    }

    /// Replace the challenge timing knobs.
    #[must_use]
    pub fn with_timing(mut self, timing: ChallengeTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Run the crawl to completion, then tear the session down.
    ///
    /// Teardown happens on every exit path, success or not.
    pub async fn run(self) -> Result<CrawlSummary> {
        let result = run_with_retry(
            |attempt| self.crawl_once(attempt),
            self.config.max_attempts,
            self.config.retry_delay_ms,
        )
        .await;

        if let Err(e) = self.driver.close().await {
            tracing::warn!("browser teardown failed: {}", e);
        }
        if result.is_ok() {
            match listings::count_listings(self.db.pool()).await {
                Ok(total) => tracing::info!(total, "listings in store"),
                Err(e) => tracing::warn!("could not read store size: {}", e),
            }
        }
        self.db.close().await;

        match &result {
            Ok(summary) => tracing::info!(
                new_listings = summary.new_listings,
                pages = summary.pages,
                dropped = summary.dropped_cards,
                "crawl complete"
            ),
            Err(e) => tracing::error!("crawl failed: {}", e),
        }

        result
    }

    /// One session attempt: search, then walk and persist pages.
    async fn crawl_once(&self, attempt: u32) -> Result<CrawlSummary> {
        tracing::info!(attempt, site = %self.site, role = %self.spec.role, "starting crawl");
        let mut session = CrawlSession::new(self.site.clone(), self.spec.clone());

        navigator::submit_search(&self.driver, &mut session, &self.timing).await?;
        self.capture_screenshot().await;

        let deadline = self
            .config
            .deadline_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs));

        let mut new_listings = 0u64;
        let mut dropped_cards = 0u64;
        let mut pages = 0u32;

        loop {
            pages += 1;
            pause(self.config.page_pause_ms).await;

            let html = self.driver.content().await.map_err(CrawlError::from)?;
            let extracted = extract_page(&html, &session.site);
            let inserted = listings::persist_page(self.db.pool(), &extracted.records).await?;
            new_listings += inserted;
            dropped_cards += extracted.dropped as u64;

            tracing::info!(
                page = pages,
                cards = extracted.cards,
                inserted,
                "{} new listings so far of {} reported",
                new_listings,
                session.reported_count
            );

            if pages >= self.config.max_pages {
                tracing::info!(max_pages = self.config.max_pages, "page ceiling reached");
                break;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::info!("crawl deadline reached");
                break;
            }

            match paginator::next_page(&html, &session.site) {
                NextPage::End => {
                    tracing::debug!("no next page control, end of results");
                    break;
                }
                NextPage::DeadEnd => {
                    tracing::warn!("next page control has no destination, stopping");
                    break;
                }
                NextPage::Advance(url) => {
                    navigator::go_to_page(&self.driver, &url).await?;
                    let mut resolver =
                        ChallengeResolver::new(&self.driver, session.site.host())
                            .with_timing(self.timing.clone());
                    if resolver.resolve().await == VerificationState::Failed {
                        tracing::warn!("challenge unresolved mid-pagination, continuing");
                    }
                }
            }
        }

        Ok(CrawlSummary {
            new_listings,
            pages,
            dropped_cards,
            reported_count: session.reported_count,
            attempts: attempt,
        })
    }

    /// Save a screenshot of the results page if the config asks for one.
    /// Screenshot faults never fail the crawl.
    async fn capture_screenshot(&self) {
        let Some(path) = &self.config.screenshot_path else {
            return;
        };
        match self.driver.screenshot().await {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(path, bytes) {
                    tracing::warn!("could not save screenshot to {}: {}", path.display(), e);
                } else {
                    tracing::debug!("screenshot saved to {}", path.display());
                }
            }
            Err(e) => tracing::warn!("screenshot capture failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedDriver;

    const COUNT_PANE: &str = r#"<div class="jobsearch-JobCountAndSortPane-jobCount css-13jafh6"><span>14 jobs</span></div>"#;

    fn card(jk: &str, title: &str) -> String {
        format!(
            r#"<div class="job_seen_beacon">
                <a class="jcs-JobTitle" data-jk="{jk}" href="/viewjob?jk={jk}">
                    <span id="jobTitle-{jk}">{title}</span>
                </a>
                <span data-testid="company-name">Acme ApS</span>
                <div data-testid="text-location">Copenhagen</div>
                <span class="date">Posted 3 days ago</span>
            </div>"#
        )
    }

    fn results_page(cards: &[String], next_href: Option<&str>) -> String {
        let next = match next_href {
            Some(href) => format!(r#"<a aria-label="Next Page" href="{href}">Next</a>"#),
            None => String::new(),
        };
        format!(
            "<html><body>{COUNT_PANE}{}{next}</body></html>",
            cards.join("")
        )
    }

    fn test_config() -> CrawlConfig {
        CrawlConfig {
            db_path: ":memory:".to_string(),
            page_pause_ms: (0, 0),
            retry_delay_ms: 0,
            ..CrawlConfig::default()
        }
    }

    async fn test_db() -> Database {
        let db = Database::open(":memory:").await.expect("open database");
        db.run_migrations().await.expect("run migrations");
        db
    }

    #[tokio::test]
    async fn test_single_page_crawl() {
        let cards: Vec<String> = (0..4).map(|i| card(&format!("jk{i}"), "Engineer")).collect();
        let driver = ScriptedDriver::new(vec![results_page(&cards, None)]);
        let db = test_db().await;

        let crawler = Crawler::new(driver, db, test_config())
            .expect("valid config")
            .with_timing(ChallengeTiming::immediate());
        let summary = crawler.run().await.expect("crawl succeeds");

        assert_eq!(summary.new_listings, 4);
        assert_eq!(summary.pages, 1);
        assert_eq!(summary.dropped_cards, 0);
        assert_eq!(summary.reported_count, ReportedCount::Known("14 jobs".to_string()));
        assert_eq!(summary.attempts, 1);
    }

    #[tokio::test]
    async fn test_pagination_terminates_at_last_page() {
        let first: Vec<String> = (0..10).map(|i| card(&format!("a{i}"), "Engineer")).collect();
        let second: Vec<String> = (0..4).map(|i| card(&format!("b{i}"), "Engineer")).collect();
        let driver = ScriptedDriver::new(vec![
            results_page(&first, Some("/jobs?q=rust&start=10")),
            results_page(&second, None),
        ]);
        let db = test_db().await;

        let crawler = Crawler::new(driver, db, test_config())
            .expect("valid config")
            .with_timing(ChallengeTiming::immediate());
        let summary = crawler.run().await.expect("crawl succeeds");

        assert_eq!(summary.new_listings, 14);
        assert_eq!(summary.pages, 2);
    }

    #[tokio::test]
    async fn test_dead_end_pagination_stops_after_persisting() {
        let cards: Vec<String> = (0..3).map(|i| card(&format!("d{i}"), "Engineer")).collect();
        let page = format!(
            "<html><body>{COUNT_PANE}{}<a aria-label=\"Next Page\">Next</a></body></html>",
            cards.join("")
        );
        let driver = ScriptedDriver::new(vec![page]);
        let db = test_db().await;

        let crawler = Crawler::new(driver, db, test_config())
            .expect("valid config")
            .with_timing(ChallengeTiming::immediate());
        let summary = crawler.run().await.expect("crawl succeeds");

        assert_eq!(summary.new_listings, 3);
        assert_eq!(summary.pages, 1);
    }

    #[tokio::test]
    async fn test_incomplete_cards_are_dropped_not_fatal() {
        let mut cards: Vec<String> = (0..3).map(|i| card(&format!("c{i}"), "Engineer")).collect();
        cards.push(r#"<div class="job_seen_beacon"><a data-jk="x9" href="/viewjob?jk=x9"></a></div>"#.to_string());
        let driver = ScriptedDriver::new(vec![results_page(&cards, None)]);
        let db = test_db().await;

        let crawler = Crawler::new(driver, db, test_config())
            .expect("valid config")
            .with_timing(ChallengeTiming::immediate());
        let summary = crawler.run().await.expect("crawl succeeds");

        assert_eq!(summary.new_listings, 3, "persisted count is cards minus dropped");
        assert_eq!(summary.dropped_cards, 1);
    }

    #[tokio::test]
    async fn test_page_ceiling_bounds_the_walk() {
        // Every page advertises a next page; only the ceiling stops the walk.
        let pages: Vec<String> = (0..10)
            .map(|i| {
                results_page(
                    &[card(&format!("p{i}"), "Engineer")],
                    Some(&format!("/jobs?start={}", (i + 1) * 10)),
                )
            })
            .collect();
        let driver = ScriptedDriver::new(pages);
        let db = test_db().await;

        let config = CrawlConfig {
            max_pages: 3,
            ..test_config()
        };
        let crawler = Crawler::new(driver, db, config)
            .expect("valid config")
            .with_timing(ChallengeTiming::immediate());
        let summary = crawler.run().await.expect("crawl succeeds");

        assert_eq!(summary.pages, 3);
        assert_eq!(summary.new_listings, 3);
    }

    #[tokio::test]
    async fn test_deadline_bounds_the_walk() {
        // Endless pagination again, but a zero-second deadline expires
        // after the first persisted page.
        let pages: Vec<String> = (0..10)
            .map(|i| {
                results_page(
                    &[card(&format!("t{i}"), "Engineer")],
                    Some(&format!("/jobs?start={}", (i + 1) * 10)),
                )
            })
            .collect();
        let driver = ScriptedDriver::new(pages);
        let db = test_db().await;

        let config = CrawlConfig {
            deadline_secs: Some(0),
            ..test_config()
        };
        let crawler = Crawler::new(driver, db, config)
            .expect("valid config")
            .with_timing(ChallengeTiming::immediate());
        let summary = crawler.run().await.expect("crawl succeeds");

        assert_eq!(summary.pages, 1);
        assert_eq!(summary.new_listings, 1);
    }

    #[tokio::test]
    async fn test_transient_search_fault_is_retried() {
        let cards: Vec<String> = (0..2).map(|i| card(&format!("r{i}"), "Engineer")).collect();
        let driver = ScriptedDriver::new(vec![results_page(&cards, None)]);
        driver.fail_next_navigations(2);
        let db = test_db().await;

        let crawler = Crawler::new(driver, db, test_config())
            .expect("valid config")
            .with_timing(ChallengeTiming::immediate());
        let summary = crawler.run().await.expect("third attempt succeeds");

        assert_eq!(summary.attempts, 3);
        assert_eq!(summary.new_listings, 2);
    }

    #[tokio::test]
    async fn test_teardown_runs_even_when_the_crawl_fails() {
        let driver = std::sync::Arc::new(ScriptedDriver::new(vec![]));
        driver.fail_next_navigations(u32::MAX);
        let db = test_db().await;

        let crawler = Crawler::new(driver.clone(), db, test_config())
            .expect("valid config")
            .with_timing(ChallengeTiming::immediate());
        let result = crawler.run().await;

        assert!(result.is_err());
        assert!(driver.closed(), "session torn down on the failure path");
    }

    #[tokio::test]
    async fn test_exhausted_attempts_surface_the_last_fault() {
        let driver = ScriptedDriver::new(vec![]);
        driver.fail_next_navigations(u32::MAX);
        let db = test_db().await;

        let crawler = Crawler::new(driver, db, test_config())
            .expect("valid config")
            .with_timing(ChallengeTiming::immediate());
        let result = crawler.run().await;

        assert!(matches!(
            result,
            Err(CrawlError::AllAttemptsExhausted { attempts: 3, .. })
        ));
    }
}
