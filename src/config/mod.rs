//! Configuration module for OpenQuake
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; a missing file section falls back to the defaults
//! that target the public PHIVOLCS site.
//!
//! # Example
//!
//! ```no_run
//! use openquake::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("openquake.toml")).unwrap();
//! println!("Scraping with {} workers", config.scraper.concurrency());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    object_key, Config, OutputConfig, RemoteConfig, RemoteKind, ScraperConfig, DEFAULT_BASE_URL,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
