//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scraper, including:
//! - Building the HTTP client with the configured signature and TLS policy
//! - GET requests for listing and detail pages
//! - Error classification
//!
//! There is no retry here: a failed detail page simply stays unscraped and is
//! picked up again on the next run.

use crate::config::ScraperConfig;
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use thiserror::Error;

/// Why a page could not be fetched
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The server answered with a non-2xx status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Connection refused, DNS failure, TLS handshake failure
    #[error("Could not connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    /// Parses the body into a navigable document
    ///
    /// The document is not `Send`; parse after the last await point.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The scraper configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use openquake::config::ScraperConfig;
/// use openquake::crawler::build_http_client;
///
/// let client = build_http_client(&ScraperConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &ScraperConfig) -> Result<Client, reqwest::Error> {
    if config.accept_invalid_certs {
        tracing::warn!("TLS certificate verification is disabled (accept-invalid-certs = true)");
    }

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages with a shared client
///
/// Cloning is cheap; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher with a client built from the configuration
    pub fn new(config: &ScraperConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::from_client(build_http_client(config)?))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Sends one GET request and returns the body of a 2xx response
    ///
    /// # Error Classification
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | HTTP 2xx | `Ok(FetchedPage)` |
    /// | Any other status | `FetchError::Status` |
    /// | Timeout | `FetchError::Timeout` |
    /// | Connection refused / TLS error | `FetchError::Connect` |
    /// | Body read or other failure | `FetchError::Transport` |
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            tracing::warn!("HTTP request on {} did not go through ({})", url, status);
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| classify(url, e))?;
        tracing::debug!("Status {} on {} HTTP GET request", status.as_u16(), url);

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}

fn classify(url: &str, error: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if error.is_connect() {
        FetchError::Connect {
            url,
            message: error.to_string(),
        }
    } else {
        FetchError::Transport {
            url,
            message: error.to_string(),
        }
    }
}
