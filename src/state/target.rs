//! Scrape targets and the per-period state built from them
use serde::{Deserialize, Serialize};
use std::fmt;

/// One earthquake detail page and whether it has been scraped
///
/// A target is identified by its `url`. The `scraped` flag only ever moves
/// from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Link text from the listing page (the event's date and time)
    #[serde(alias = "datetime")]
    pub label: String,

    /// Absolute URL of the detail page
    pub url: String,

    /// Whether the detail page was fetched and parsed successfully
    #[serde(default)]
    pub scraped: bool,
}

impl Target {
    /// Creates a target that has not been scraped yet
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
            scraped: false,
        }
    }

    /// Marks the target as scraped
    pub fn mark_scraped(&mut self) {
        self.scraped = true;
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = if self.scraped { "scraped" } else { "pending" };
        write!(f, "{} <{}> ({})", self.label, self.url, flag)
    }
}

/// Counts scraped and unscraped targets in a period state
pub fn count_scraped(targets: &[Target]) -> (usize, usize) {
    let scraped = targets.iter().filter(|t| t.scraped).count();
    (scraped, targets.len() - scraped)
}
