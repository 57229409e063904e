//! Search submission and results-page reading.
//!
//! Builds the search URL from typed parameters, drives the navigation
//! (challenge resolution included), and reads the site's reported result
//! count through a selector cascade. The count is display text only; a
//! page that never renders it degrades to `Unknown` rather than failing
//! the crawl.

use crate::challenge::{ChallengeResolver, ChallengeTiming, VerificationState};
use crate::error::Result;
use crate::session::CrawlSession;
use jobsift_browser::Driver;
use jobsift_core::{ReportedCount, SearchSpec, SiteId};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::time::{Duration, Instant};

static COUNT_PRIMARY: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"div[class^="jobsearch-JobCountAndSortPane-jobCount"] span"#)
        .expect("valid selector")
});
static COUNT_PANE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"div[class*="jobsearch-JobCountAndSortPane"] span"#)
        .expect("valid selector")
});
static ANY_DIV: Lazy<Selector> = Lazy::new(|| Selector::parse("div").expect("valid selector"));

/// Build the search URL for a role/location/recency query.
#[must_use]
pub fn build_search_url(site: &SiteId, spec: &SearchSpec) -> String {
    let role = plus_joined(&spec.role);
    let location = plus_joined(&spec.location);
    format!(
        "{}/jobs?q={}&l={}&fromage={}",
        site.as_str(),
        role,
        location,
        spec.fromage_days
    )
}

fn plus_joined(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join("+")
}

/// Read the reported result count from a page snapshot.
///
/// Tries the dedicated count pane selectors first, then falls back to the
/// most specific `div` mentioning "jobs". No hit means `Unknown`.
#[must_use]
pub fn reported_count_from(html: &str) -> ReportedCount {
    let document = Html::parse_document(html);

    for selector in [&*COUNT_PRIMARY, &*COUNT_PANE] {
        if let Some(text) = document
            .select(selector)
            .next()
            .map(|el| el.text().collect::<String>())
        {
            let text = text.trim();
            if !text.is_empty() {
                return ReportedCount::Known(text.to_string());
            }
        }
    }

    document
        .select(&ANY_DIV)
        .filter_map(|div| {
            let text = div.text().collect::<String>().trim().to_string();
            if text.contains("jobs") {
                Some(text)
            } else {
                None
            }
        })
        .min_by_key(String::len)
        .map_or(ReportedCount::Unknown, ReportedCount::Known)
}

/// Submit the search and bring the session to a readable results page.
///
/// Navigates to the built URL, runs challenge resolution, then reads the
/// reported count into the session. Returns the resolver's terminal state
/// so the caller can log degraded confidence.
pub async fn submit_search<D: Driver>(
    driver: &D,
    session: &mut CrawlSession,
    timing: &ChallengeTiming,
) -> Result<VerificationState> {
    let url = build_search_url(&session.site, &session.spec);
    tracing::info!(%url, "submitting search");
    driver.navigate(&url).await?;

    let mut resolver =
        ChallengeResolver::new(driver, session.site.host()).with_timing(timing.clone());
    let outcome = resolver.resolve().await;
    if outcome == VerificationState::Failed {
        tracing::warn!("challenge unresolved, proceeding with degraded confidence");
    }

    session.reported_count = read_reported_count(driver, timing).await;
    tracing::info!("{} found", session.reported_count);

    Ok(outcome)
}

/// Navigate to a paginated results URL.
pub async fn go_to_page<D: Driver>(driver: &D, url: &str) -> Result<()> {
    tracing::debug!(%url, "advancing to next results page");
    driver.navigate(url).await?;
    Ok(())
}

/// Poll the page, bounded by twice the probe budget, for the count pane.
async fn read_reported_count<D: Driver>(driver: &D, timing: &ChallengeTiming) -> ReportedCount {
    let deadline = Instant::now() + Duration::from_millis(timing.probe_timeout_ms * 2);
    loop {
        if let Ok(html) = driver.content().await {
            if let ReportedCount::Known(text) = reported_count_from(&html) {
                return ReportedCount::Known(text);
            }
        }
        if Instant::now() >= deadline {
            tracing::warn!("no job count found on results page");
            return ReportedCount::Unknown;
        }
        tokio::time::sleep(Duration::from_millis(timing.poll_interval_ms)).await;
    }
}
