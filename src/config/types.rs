use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Landing page of the PHIVOLCS earthquake information site
pub const DEFAULT_BASE_URL: &str = "https://earthquake.phivolcs.dost.gov.ph";

/// Browser-like signature; the bulletin server rejects unknown clients
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0";

/// Main configuration structure for OpenQuake
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

/// Scraper behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Base URL used to resolve relative record links
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Monthly listing page to scrape when none is given on the command line
    #[serde(rename = "period-url", default)]
    pub period_url: Option<String>,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Skip TLS certificate verification
    #[serde(rename = "accept-invalid-certs", default)]
    pub accept_invalid_certs: bool,

    /// Maximum number of detail pages fetched at once
    #[serde(rename = "max-concurrency", default)]
    pub max_concurrency: Option<usize>,

    /// Whole-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl ScraperConfig {
    /// Degree of parallelism for the detail fetch pool
    ///
    /// Falls back to the available hardware concurrency when not configured.
    pub fn concurrency(&self) -> usize {
        self.max_concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(4)
        })
    }

    /// The listing page to start from: an explicit override, the configured
    /// period URL, or the base URL (which lists the latest month)
    pub fn listing_url<'a>(&'a self, override_url: Option<&'a str>) -> &'a str {
        override_url
            .or(self.period_url.as_deref())
            .unwrap_or(&self.base_url)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            period_url: None,
            user_agent: default_user_agent(),
            accept_invalid_certs: false,
            max_concurrency: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Local output locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory holding one `<period>.json` state file per month
    #[serde(rename = "state-dir", default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Directory receiving the Parquet files
    #[serde(rename = "output-dir", default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            output_dir: default_output_dir(),
        }
    }
}

/// Which object store backs the remote copy of state and output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteKind {
    /// A directory acting as a bucket
    Local,
    /// Amazon S3 or a compatible endpoint
    S3,
}

/// Remote object store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    pub kind: RemoteKind,

    /// Root directory for the `local` kind
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Bucket name for the `s3` kind
    #[serde(default)]
    pub bucket: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint for S3-compatible services
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Key prefix for period state files
    #[serde(rename = "state-prefix", default = "default_state_prefix")]
    pub state_prefix: String,

    /// Key prefix for Parquet files
    #[serde(rename = "output-prefix", default)]
    pub output_prefix: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("conf")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_state_prefix() -> String {
    "conf".to_string()
}

/// Joins a key prefix and a name into an object key
pub fn object_key(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}
