//! Configuration management for the delivery board
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::feed::fetcher::parse_feed_url;
use crate::parser::StrategyChoice;

/// Default refresh interval (5 minutes)
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 5 * 60;

/// Default staleness threshold for visibility-triggered refresh (10 minutes)
pub const DEFAULT_STALE_AFTER_SECS: u64 = 10 * 60;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Feed location and HTTP settings
    pub feed: FeedConfig,

    /// Refresh scheduling
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Row parsing
    #[serde(default)]
    pub parser: ParserConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Feed-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Published CSV URL
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Refresh scheduling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Periodic refresh interval in seconds
    pub interval_secs: u64,

    /// Age after which a visibility/focus event triggers a refresh
    pub stale_after_secs: u64,
}

/// Row parsing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// auto, delimited or fallback
    pub strategy: StrategyChoice,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("delivery-board/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            stale_after_secs: DEFAULT_STALE_AFTER_SECS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl FeedConfig {
    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl RefreshConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    #[must_use]
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}

impl Config {
    /// Create a configuration for `url` with every other value defaulted
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            feed: FeedConfig {
                url: url.into(),
                request_timeout_secs: default_request_timeout_secs(),
                user_agent: default_user_agent(),
            },
            refresh: RefreshConfig::default(),
            parser: ParserConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// `DELIVERY_BOARD_FEED_URL` is required; every other variable is optional.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("DELIVERY_BOARD_FEED_URL")
            .context("DELIVERY_BOARD_FEED_URL is not set")?;

        let request_timeout_secs = std::env::var("DELIVERY_BOARD_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(default_request_timeout_secs);

        let user_agent =
            std::env::var("DELIVERY_BOARD_USER_AGENT").unwrap_or_else(|_| default_user_agent());

        let interval_secs = std::env::var("DELIVERY_BOARD_REFRESH_INTERVAL")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS);

        let stale_after_secs = std::env::var("DELIVERY_BOARD_STALE_AFTER")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_STALE_AFTER_SECS);

        let strategy = match std::env::var("DELIVERY_BOARD_PARSER") {
            Ok(v) => v.parse::<StrategyChoice>().map_err(anyhow::Error::msg)?,
            Err(_) => StrategyChoice::default(),
        };

        let level =
            std::env::var("DELIVERY_BOARD_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));

        let format =
            std::env::var("DELIVERY_BOARD_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        Ok(Self {
            feed: FeedConfig {
                url,
                request_timeout_secs,
                user_agent,
            },
            refresh: RefreshConfig {
                interval_secs,
                stale_after_secs,
            },
            parser: ParserConfig { strategy },
            logging: LoggingConfig { level, format },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        parse_feed_url(&self.feed.url).context("feed.url is invalid")?;

        if self.feed.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if self.refresh.interval_secs == 0 {
            anyhow::bail!("interval_secs must be greater than 0");
        }

        if self.refresh.stale_after_secs == 0 {
            anyhow::bail!("stale_after_secs must be greater than 0");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!(
                "Unknown log format '{}'. Valid options: text, json",
                self.logging.format
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config::for_url("https://example.com/pub?output=csv")
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_default_intervals() {
        let config = valid();
        assert_eq!(config.refresh.interval(), Duration::from_secs(300));
        assert_eq!(config.refresh.stale_after(), Duration::from_secs(600));
        assert_eq!(config.feed.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.parser.strategy, StrategyChoice::Auto);
    }

    #[test]
    fn test_invalid_url() {
        let mut config = valid();
        config.feed.url = "file:///tmp/feed.csv".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_interval() {
        let mut config = valid();
        config.refresh.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = valid();
        config.logging.format = "xml".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_minimal_toml() {
        let config: Config = toml::from_str(
            r#"
            [feed]
            url = "https://example.com/feed.csv"
            "#,
        )
        .unwrap();
        assert_eq!(config.refresh.interval_secs, DEFAULT_REFRESH_INTERVAL_SECS);
        assert_eq!(config.logging.format, "text");
        assert!(config.validate().is_ok());
    }
}
