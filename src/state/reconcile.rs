//! Reconciliation of previously persisted targets with a fresh listing

use crate::state::Target;
use std::collections::HashSet;

/// Outcome of merging a period's saved state with a new listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Period the targets belong to
    pub period: String,

    /// Targets to fetch in this run: unscraped saved targets first, then new ones
    pub pending: Vec<Target>,

    /// The new period state: saved targets followed by the new ones
    pub merged: Vec<Target>,

    /// How many discovered targets were not known before
    pub new_items: usize,
}

impl Reconciliation {
    /// True when there is nothing to fetch and nothing new was discovered
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.new_items == 0
    }
}

/// Merges the saved targets of a period with the targets found on its listing
///
/// A discovered target is new when its URL does not appear in `previous`,
/// regardless of the saved target's `scraped` flag. New targets are
/// deduplicated by URL (first occurrence wins) and appended to the saved ones
/// in listing order, so the merged state can be persisted before any fetching
/// starts.
///
/// # Example
///
/// ```
/// use openquake::state::{reconcile, Target};
///
/// let mut a = Target::new("A", "https://example.com/a");
/// a.mark_scraped();
/// let discovered = vec![
///     Target::new("A", "https://example.com/a"),
///     Target::new("B", "https://example.com/b"),
/// ];
///
/// let result = reconcile("January 2023", vec![a], discovered);
/// assert_eq!(result.pending.len(), 1);
/// assert_eq!(result.pending[0].url, "https://example.com/b");
/// assert_eq!(result.merged.len(), 2);
/// ```
pub fn reconcile(period_id: &str, previous: Vec<Target>, discovered: Vec<Target>) -> Reconciliation {
    let mut known: HashSet<String> = previous.iter().map(|t| t.url.clone()).collect();

    let mut pending: Vec<Target> = previous.iter().filter(|t| !t.scraped).cloned().collect();
    let resumed = pending.len();

    let mut merged = previous;
    let mut new_items = 0;

    for target in discovered {
        if known.insert(target.url.clone()) {
            pending.push(target.clone());
            merged.push(target);
            new_items += 1;
        }
    }

    tracing::debug!(
        "Reconciled {}: {} unscraped from previous runs, {} new, {} total",
        period_id,
        resumed,
        new_items,
        merged.len()
    );

    Reconciliation {
        period: period_id.to_string(),
        pending,
        merged,
        new_items,
    }
}

/// Marks every target whose URL succeeded as scraped
///
/// Flags are never reset: a target that was already scraped stays scraped
/// whether or not it appears in `succeeded_urls`.
pub fn commit_results(
    period_id: &str,
    mut merged: Vec<Target>,
    succeeded_urls: &HashSet<String>,
) -> Vec<Target> {
    let mut committed = 0;
    for target in merged.iter_mut() {
        if !target.scraped && succeeded_urls.contains(&target.url) {
            target.mark_scraped();
            committed += 1;
        }
    }

    tracing::debug!(
        "Committed {} of {} succeeded URLs for {}",
        committed,
        succeeded_urls.len(),
        period_id
    );

    merged
}
