//! State module for tracking scrape progress
//!
//! This module provides the per-period state that makes runs resumable.
//!
//! # Components
//!
//! - `Target`: one detail page and whether it has been scraped
//! - `EarthquakeEvent`: the record extracted from a detail page
//! - `reconcile` / `commit_results`: merging saved and discovered targets
//! - `StateStore`: JSON persistence with optional remote mirroring

mod event;
mod reconcile;
mod store;
mod target;

// Re-export main types
pub use event::EarthquakeEvent;
pub use reconcile::{commit_results, reconcile, Reconciliation};
pub use store::{period_file_stem, StateError, StateStore};
pub use target::{count_scraped, Target};
