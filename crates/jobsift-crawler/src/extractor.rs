//! Result-card field extraction.
//!
//! Pure functions over a rendered-markup snapshot. Each field is resolved
//! by an ordered list of strategies tried until one yields a non-empty
//! value, so the extractor survives the site shuffling its markup between
//! variants. A card with no URL or no title is dropped and counted; a
//! missing optional field stores as absent, never a placeholder.

use jobsift_core::SiteId;
use jobsift_db::NewListing;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static CARD: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.job_seen_beacon").expect("valid selector"));
static LINK_DATA_JK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[data-jk]").expect("valid selector"));
static LINK_TITLE_CLASS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[class*="JobTitle"]"#).expect("valid selector"));
static TITLE_SPAN_ID: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"span[id^="jobTitle-"]"#).expect("valid selector"));
static COMPANY_TESTID: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"span[data-testid="company-name"]"#).expect("valid selector"));
static FRESHNESS_DATE_CLASS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.date").expect("valid selector"));
static FRESHNESS_TESTID: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"span[data-testid="myJobsStateDate"]"#).expect("valid selector")
});
static LOCATION_TESTID: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"div[data-testid="text-location"]"#).expect("valid selector"));
static ANY_SPAN: Lazy<Selector> = Lazy::new(|| Selector::parse("span").expect("valid selector"));
static ANY_DIV: Lazy<Selector> = Lazy::new(|| Selector::parse("div").expect("valid selector"));

/// One way of pulling a field's text out of a result card.
type Strategy = fn(&ElementRef<'_>) -> Option<String>;

/// Everything extracted from one results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Records that passed the completeness gate, in page order
    pub records: Vec<NewListing>,
    /// How many result cards the page carried
    pub cards: usize,
    /// Cards dropped for missing a URL or title
    pub dropped: usize,
}

/// Extract every result card from a page snapshot.
///
/// Card paths are canonicalized against `site` so the same listing hashes
/// to the same URL on every crawl.
#[must_use]
pub fn extract_page(html: &str, site: &SiteId) -> ExtractedPage {
    let document = Html::parse_document(html);
    let mut records = Vec::new();
    let mut cards = 0usize;
    let mut dropped = 0usize;

    for card in document.select(&CARD) {
        cards += 1;
        match extract_card(&card, site) {
            Some(listing) => records.push(listing),
            None => {
                dropped += 1;
                tracing::debug!("dropped incomplete result card (no url or title)");
            }
        }
    }

    ExtractedPage {
        records,
        cards,
        dropped,
    }
}

/// Extract one card, or `None` if it fails the completeness gate.
fn extract_card(card: &ElementRef<'_>, site: &SiteId) -> Option<NewListing> {
    const LINK_STRATEGIES: &[Strategy] = &[link_by_data_jk, link_by_title_class];
    const TITLE_STRATEGIES: &[Strategy] = &[title_by_link_text, title_by_span_id];
    const COMPANY_STRATEGIES: &[Strategy] = &[company_by_testid, company_by_class];
    const FRESHNESS_STRATEGIES: &[Strategy] = &[freshness_by_date_class, freshness_by_testid];
    const LOCATION_STRATEGIES: &[Strategy] = &[location_by_testid, location_by_class];

    let path = first_match(card, LINK_STRATEGIES)?;
    let title = first_match(card, TITLE_STRATEGIES)?;

    Some(NewListing {
        url: site.join(&path),
        title,
        company: first_match(card, COMPANY_STRATEGIES),
        freshness_label: first_match(card, FRESHNESS_STRATEGIES),
        location: first_match(card, LOCATION_STRATEGIES),
        source_site: site.to_string(),
    })
}

/// Try each strategy in order; first non-empty value wins.
fn first_match(card: &ElementRef<'_>, strategies: &[Strategy]) -> Option<String> {
    strategies.iter().find_map(|strategy| strategy(card))
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn element_text(element: &ElementRef<'_>) -> Option<String> {
    non_empty(element.text().collect::<String>())
}

fn link_by_data_jk(card: &ElementRef<'_>) -> Option<String> {
    card.select(&LINK_DATA_JK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(ToString::to_string)
        .and_then(non_empty)
}

fn link_by_title_class(card: &ElementRef<'_>) -> Option<String> {
    card.select(&LINK_TITLE_CLASS)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(ToString::to_string)
        .and_then(non_empty)
}

fn title_by_link_text(card: &ElementRef<'_>) -> Option<String> {
    card.select(&LINK_TITLE_CLASS)
        .next()
        .as_ref()
        .and_then(element_text)
}

fn title_by_span_id(card: &ElementRef<'_>) -> Option<String> {
    card.select(&TITLE_SPAN_ID)
        .next()
        .as_ref()
        .and_then(element_text)
}

fn company_by_testid(card: &ElementRef<'_>) -> Option<String> {
    card.select(&COMPANY_TESTID)
        .next()
        .as_ref()
        .and_then(element_text)
}

fn company_by_class(card: &ElementRef<'_>) -> Option<String> {
    card.select(&ANY_SPAN)
        .find(|span| class_contains(span, "company"))
        .as_ref()
        .and_then(element_text)
}

fn freshness_by_date_class(card: &ElementRef<'_>) -> Option<String> {
    card.select(&FRESHNESS_DATE_CLASS)
        .next()
        .as_ref()
        .and_then(element_text)
}

fn freshness_by_testid(card: &ElementRef<'_>) -> Option<String> {
    card.select(&FRESHNESS_TESTID)
        .next()
        .as_ref()
        .and_then(element_text)
}

// The first inner span carries the bare location; the div's own text can
// pick up sibling badges, so it is only the fallback.
fn location_by_testid(card: &ElementRef<'_>) -> Option<String> {
    let div = card.select(&LOCATION_TESTID).next()?;
    div.select(&ANY_SPAN)
        .next()
        .as_ref()
        .and_then(element_text)
        .or_else(|| element_text(&div))
}

fn location_by_class(card: &ElementRef<'_>) -> Option<String> {
    card.select(&ANY_DIV)
        .find(|div| class_contains(div, "location"))
        .as_ref()
        .and_then(element_text)
}

fn class_contains(element: &ElementRef<'_>, fragment: &str) -> bool {
    element
        .value()
        .attr("class")
        .is_some_and(|class| class.to_lowercase().contains(fragment))
}
