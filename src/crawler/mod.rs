//! Crawler module for listing discovery and detail scraping
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with the configured signature
//! - Listing extraction (period heading and record links)
//! - Bulletin extraction into earthquake events
//! - Bounded concurrent scraping of pending targets
//! - Overall run coordination

mod coordinator;
mod detail;
mod fetcher;
mod listing;
mod orchestrator;
mod progress;

pub use coordinator::{Coordinator, RunOutcome};
pub use detail::{
    extract_event, parse_bulletin_datetime, parse_coordinates, parse_depth, parse_expected_flag,
    parse_magnitude, DateParseError, ParseError,
};
pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher};
pub use listing::{extract_period, extract_targets, ExtractionError};
pub use orchestrator::{FailureReason, Harvest, Orchestrator, TargetFailure};
pub use progress::progress_bar;
