use crate::config::types::{Config, OutputConfig, RemoteConfig, RemoteKind, ScraperConfig};
use crate::ConfigError;
use url::Url;

const MAX_CONCURRENCY: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_output_config(&config.output)?;
    if let Some(remote) = &config.remote {
        validate_remote_config(remote)?;
    }
    Ok(())
}

/// Validates scraper configuration
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    validate_http_url("base-url", &config.base_url)?;

    if let Some(period_url) = &config.period_url {
        validate_http_url("period-url", period_url)?;
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if let Some(n) = config.max_concurrency {
        if n < 1 || n > MAX_CONCURRENCY {
            return Err(ConfigError::Validation(format!(
                "max-concurrency must be between 1 and {}, got {}",
                MAX_CONCURRENCY, n
            )));
        }
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.state_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "state-dir cannot be empty".to_string(),
        ));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that the selected store kind has what it needs
fn validate_remote_config(config: &RemoteConfig) -> Result<(), ConfigError> {
    match config.kind {
        RemoteKind::Local => {
            if config.root.is_none() {
                return Err(ConfigError::Validation(
                    "remote.root is required for the local store".to_string(),
                ));
            }
        }
        RemoteKind::S3 => {
            let bucket = config.bucket.as_deref().unwrap_or("");
            if bucket.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "remote.bucket is required for the s3 store".to_string(),
                ));
            }
            if let Some(endpoint) = &config.endpoint {
                validate_http_url("remote.endpoint", endpoint)?;
            }
        }
    }

    Ok(())
}

/// Validates that a value parses as an http(s) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(kind: RemoteKind) -> RemoteConfig {
        RemoteConfig {
            kind,
            root: None,
            bucket: None,
            region: None,
            endpoint: None,
            state_prefix: "conf".to_string(),
            output_prefix: String::new(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = Config::default();
        config.scraper.base_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_non_http_period_url() {
        let mut config = Config::default();
        config.scraper.period_url = Some("ftp://example.com/list".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_concurrency_bounds() {
        let mut config = Config::default();
        config.scraper.max_concurrency = Some(0);
        assert!(validate(&config).is_err());

        config.scraper.max_concurrency = Some(MAX_CONCURRENCY + 1);
        assert!(validate(&config).is_err());

        config.scraper.max_concurrency = Some(16);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_user_agent() {
        let mut config = Config::default();
        config.scraper.user_agent = "   ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_local_remote_requires_root() {
        let mut config = Config::default();
        config.remote = Some(remote(RemoteKind::Local));
        assert!(validate(&config).is_err());

        let mut with_root = remote(RemoteKind::Local);
        with_root.root = Some("/tmp/bucket".into());
        config.remote = Some(with_root);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_s3_remote_requires_bucket() {
        let mut config = Config::default();
        config.remote = Some(remote(RemoteKind::S3));
        assert!(validate(&config).is_err());

        let mut with_bucket = remote(RemoteKind::S3);
        with_bucket.bucket = Some("open-quake1".to_string());
        config.remote = Some(with_bucket);
        assert!(validate(&config).is_ok());
    }
}
