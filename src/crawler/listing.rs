//! Record extraction from monthly listing pages
//!
//! A listing page holds the month name in its second `MsoNormalTable` and the
//! links to every earthquake of that month in the third one.

use crate::links::resolve_record_url;
use crate::state::Target;
use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

const PERIOD_SELECTOR: &str = "div > table.MsoNormalTable:nth-of-type(2) strong";
const LISTING_SELECTOR: &str = "div > table.MsoNormalTable:nth-of-type(3)";
const RECORD_LINK_SELECTOR: &str = "td span a";

/// The listing page does not have the expected structure
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    #[error("listing page has no period heading")]
    MissingPeriod,

    #[error("listing page has no record table")]
    MissingListing,

    #[error("invalid selector {0}")]
    Selector(String),
}

/// Extracts the period id and its record links from a listing document
///
/// Links without an `href` or with an empty label are skipped. Every target
/// comes back unscraped and in document order; duplicates are left for
/// reconciliation to drop.
///
/// # Example
///
/// ```
/// use openquake::crawler::extract_targets;
/// use scraper::Html;
/// use url::Url;
///
/// let html = Html::parse_document(r#"<div>
///     <table class="MsoNormalTable"><tr><td>header</td></tr></table>
///     <table class="MsoNormalTable"><tr><td><strong>January 2023</strong></td></tr></table>
///     <table class="MsoNormalTable"><tr><td><span><a href="a\b.html">05 January 2023 - 02:30 PM</a></span></td></tr></table>
/// </div>"#);
/// let base = Url::parse("https://example.com/").unwrap();
///
/// let (period, targets) = extract_targets(&html, &base).unwrap();
/// assert_eq!(period, "January 2023");
/// assert_eq!(targets[0].url, "https://example.com/a/b.html");
/// ```
pub fn extract_targets(
    document: &Html,
    base_url: &Url,
) -> Result<(String, Vec<Target>), ExtractionError> {
    let period = extract_period(document)?;

    let listing_selector = selector(LISTING_SELECTOR)?;
    let link_selector = selector(RECORD_LINK_SELECTOR)?;

    let table = document
        .select(&listing_selector)
        .next()
        .ok_or(ExtractionError::MissingListing)?;

    let mut targets = Vec::new();
    for link in table.select(&link_selector) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };

        let label = link.text().collect::<String>().trim().to_string();
        if label.is_empty() {
            continue;
        }

        match resolve_record_url(href, base_url) {
            Ok(url) => targets.push(Target::new(label, url.to_string())),
            Err(e) => tracing::debug!("Skipping record link {}: {}", href, e),
        }
    }

    tracing::debug!("Found {} record links for {}", targets.len(), period);
    Ok((period, targets))
}

/// Extracts the period heading (e.g. "January 2023")
pub fn extract_period(document: &Html) -> Result<String, ExtractionError> {
    let period_selector = selector(PERIOD_SELECTOR)?;

    document
        .select(&period_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ExtractionError::MissingPeriod)
}

fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|_| ExtractionError::Selector(css.to_string()))
}
