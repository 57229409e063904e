//! Pagination over result pages.
//!
//! The next-page control is identified purely by its accessibility label,
//! which has outlived several markup redesigns. Absence of the control is
//! the normal end of results; a control with no destination is a page
//! anomaly and ends the crawl defensively rather than risking a loop.

use jobsift_core::SiteId;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static NEXT_PAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[aria-label="Next Page"]"#).expect("valid selector"));

/// What the current results page says about continuing the crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// A next-page link with this canonical URL
    Advance(String),
    /// No next-page control: the last page of results
    End,
    /// A next-page control with no destination
    DeadEnd,
}

/// Inspect a page snapshot for the next-page control.
#[must_use]
pub fn next_page(html: &str, site: &SiteId) -> NextPage {
    let document = Html::parse_document(html);
    match document.select(&NEXT_PAGE).next() {
        Some(anchor) => match anchor.value().attr("href") {
            Some(href) if !href.trim().is_empty() => NextPage::Advance(site.join(href)),
            _ => NextPage::DeadEnd,
        },
        None => NextPage::End,
    }
}
