//! Link handling for listing pages
//!
//! Record links on the bulletin site are written by hand in Windows tooling,
//! so they mix `\` and `/` separators and are usually relative. This module
//! turns them into absolute, fetchable URLs.

mod resolve;

pub use resolve::{normalize_separators, resolve_record_url};
