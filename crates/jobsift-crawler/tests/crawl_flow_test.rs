//! End-to-end crawl flow over a scripted driver and a real on-disk store.

use jobsift_core::{CrawlConfig, ReportedCount};
use jobsift_crawler::testing::ScriptedDriver;
use jobsift_crawler::{ChallengeTiming, Crawler};
use jobsift_db::{listings, Database};

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

fn scripted_pages() -> Vec<String> {
    let first: Vec<String> = (0..10).map(|i| card(&format!("a{i}"), "Engineer")).collect();
    let second: Vec<String> = (0..4).map(|i| card(&format!("b{i}"), "Engineer")).collect();
    vec![
        format!(
            "<html><body>{COUNT_PANE}{}<a aria-label=\"Next Page\" href=\"/jobs?q=rust&start=10\">Next</a></body></html>",
            first.join("")
        ),
        format!("<html><body>{COUNT_PANE}{}</body></html>", second.join("")),
    ]
}

fn config(db_path: &str) -> CrawlConfig {
    CrawlConfig {
        db_path: db_path.to_string(),
        page_pause_ms: (0, 0),
        retry_delay_ms: 0,
        ..CrawlConfig::default()
    }
}

async fn crawl(db_path: &str) -> jobsift_crawler::CrawlSummary {
    let driver = ScriptedDriver::new(scripted_pages());
    let db = Database::open(db_path).await.expect("open database");
    db.run_migrations().await.expect("run migrations");

    let crawler = Crawler::new(driver, db, config(db_path))
        .expect("valid config")
        .with_timing(ChallengeTiming::immediate());

    crawler.run().await.expect("crawl succeeds")
}

#[tokio::test]
async fn test_repeat_crawl_is_idempotent() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = dir.path().join("jobs.db");
    let db_path = db_path.to_str().expect("utf8 path");

    // First crawl: two pages of ten and four distinct listings
    let summary = crawl(db_path).await;
    assert_eq!(summary.new_listings, 14);
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.dropped_cards, 0);
    assert_eq!(
        summary.reported_count,
        ReportedCount::Known("14 jobs".to_string())
    );

    // Second crawl over the same store: every URL collides, nothing new
    let summary = crawl(db_path).await;
    assert_eq!(summary.new_listings, 0);
    assert_eq!(summary.pages, 2);

    let db = Database::open(db_path).await.expect("reopen database");
    let total = listings::count_listings(db.pool()).await.expect("count");
    assert_eq!(total, 14);

    let stored = listings::get_by_url(db.pool(), "https://dk.indeed.com/viewjob?jk=a0")
        .await
        .expect("get by url")
        .expect("row exists");
    assert_eq!(stored.title, "Engineer");
    assert_eq!(stored.company.as_deref(), Some("Acme ApS"));
    db.close().await;
}

#[tokio::test]
async fn test_navigation_and_teardown() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = dir.path().join("jobs.db");
    let db_path = db_path.to_str().expect("utf8 path");

    let driver = std::sync::Arc::new(ScriptedDriver::new(scripted_pages()));
    let db = Database::open(db_path).await.expect("open database");
    db.run_migrations().await.expect("run migrations");

    let crawler = Crawler::new(driver.clone(), db, config(db_path))
        .expect("valid config")
        .with_timing(ChallengeTiming::immediate());
    crawler.run().await.expect("crawl succeeds");

    let log = driver.navigation_log();
    assert_eq!(
        log[0],
        "https://dk.indeed.com/jobs?q=software+engineer&l=Copenhagen&fromage=7"
    );
    assert_eq!(log[1], "https://dk.indeed.com/jobs?q=rust&start=10");
    assert!(driver.closed(), "session torn down after the crawl");
}
