//! Configuration module for loading and parsing TOML configuration files.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use whatsonchain_client::{
    ClientOptions, Network, SOCKET_ENDPOINT_BLOCK_HEADERS, SOCKET_ENDPOINT_MEMPOOL,
};

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse TOML configuration.
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// Invalid configuration value.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Network whose API is queried.
    pub network: Network,
    /// HTTP client settings.
    pub client: ClientSettings,
    /// Event feed settings.
    pub feed: FeedConfig,
}

/// HTTP client settings, durations in milliseconds.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientSettings {
    /// Retries after the first attempt.
    pub retry_count: u32,
    /// Growth factor between consecutive waits.
    pub back_off_exponent_factor: f64,
    /// First wait.
    pub back_off_initial_timeout_ms: u64,
    /// Upper bound on the random jitter added to each wait.
    pub back_off_maximum_jitter_interval_ms: u64,
    /// Upper bound on each wait.
    pub back_off_max_timeout_ms: u64,
    /// TCP keep-alive interval.
    pub dialer_keep_alive_ms: u64,
    /// TCP connect timeout.
    pub dialer_timeout_ms: u64,
    /// Per-attempt request timeout.
    pub request_timeout_ms: u64,
    /// Expect-continue timeout.
    pub transport_expect_continue_timeout_ms: u64,
    /// Idle pooled connection lifetime.
    pub transport_idle_timeout_ms: u64,
    /// Idle pooled connections kept per host.
    pub transport_max_idle_connections: usize,
    /// TLS handshake timeout.
    pub transport_tls_handshake_timeout_ms: u64,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::from_options(&ClientOptions::default())
    }
}

impl ClientSettings {
    fn from_options(options: &ClientOptions) -> Self {
        Self {
            retry_count: options.request_retry_count,
            back_off_exponent_factor: options.back_off_exponent_factor,
            back_off_initial_timeout_ms: millis(options.back_off_initial_timeout),
            back_off_maximum_jitter_interval_ms: millis(options.back_off_maximum_jitter_interval),
            back_off_max_timeout_ms: millis(options.back_off_max_timeout),
            dialer_keep_alive_ms: millis(options.dialer_keep_alive),
            dialer_timeout_ms: millis(options.dialer_timeout),
            request_timeout_ms: millis(options.request_timeout),
            transport_expect_continue_timeout_ms: millis(options.transport_expect_continue_timeout),
            transport_idle_timeout_ms: millis(options.transport_idle_timeout),
            transport_max_idle_connections: options.transport_max_idle_connections,
            transport_tls_handshake_timeout_ms: millis(options.transport_tls_handshake_timeout),
            user_agent: options.user_agent.clone(),
        }
    }

    /// Converts the settings into client options.
    #[must_use]
    pub fn to_options(&self) -> ClientOptions {
        ClientOptions {
            request_retry_count: self.retry_count,
            back_off_exponent_factor: self.back_off_exponent_factor,
            back_off_initial_timeout: Duration::from_millis(self.back_off_initial_timeout_ms),
            back_off_maximum_jitter_interval: Duration::from_millis(
                self.back_off_maximum_jitter_interval_ms,
            ),
            back_off_max_timeout: Duration::from_millis(self.back_off_max_timeout_ms),
            dialer_keep_alive: Duration::from_millis(self.dialer_keep_alive_ms),
            dialer_timeout: Duration::from_millis(self.dialer_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            transport_expect_continue_timeout: Duration::from_millis(
                self.transport_expect_continue_timeout_ms,
            ),
            transport_idle_timeout: Duration::from_millis(self.transport_idle_timeout_ms),
            transport_max_idle_connections: self.transport_max_idle_connections,
            transport_tls_handshake_timeout: Duration::from_millis(
                self.transport_tls_handshake_timeout_ms,
            ),
            user_agent: self.user_agent.clone(),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Event feed configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    /// Feed to stream.
    pub channel: FeedChannel,
}

/// Event feeds offered by the socket server.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedChannel {
    /// Transactions entering the mempool.
    #[default]
    Mempool,
    /// New block headers.
    BlockHeaders,
}

impl FeedChannel {
    /// Socket URL of the feed.
    #[must_use]
    pub fn url(&self) -> &'static str {
        match self {
            FeedChannel::Mempool => SOCKET_ENDPOINT_MEMPOOL,
            FeedChannel::BlockHeaders => SOCKET_ENDPOINT_BLOCK_HEADERS,
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file.
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Arguments
    /// * `content` - TOML content as string.
    ///
    /// # Errors
    /// Returns error if content cannot be parsed.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    fn validate(&self) -> Result<(), ConfigError> {
        let factor = self.client.back_off_exponent_factor;
        if !factor.is_finite() || factor < 1.0 {
            return Err(ConfigError::InvalidValue(format!(
                "back_off_exponent_factor must be at least 1.0, got {}",
                factor
            )));
        }
        if self.client.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue("user_agent cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use whatsonchain_client::DEFAULT_USER_AGENT;

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
network = "test"

[client]
retry_count = 4
back_off_exponent_factor = 1.5
request_timeout_ms = 2500
user_agent = "feed-test/1.0"

[feed]
channel = "block_headers"
"#;

        let config = Config::parse(toml_content).unwrap();
        assert_eq!(config.network, Network::Test);
        assert_eq!(config.client.retry_count, 4);
        assert_eq!(config.feed.channel, FeedChannel::BlockHeaders);

        let options = config.client.to_options();
        assert_eq!(options.request_retry_count, 4);
        assert_eq!(options.back_off_exponent_factor, 1.5);
        assert_eq!(options.request_timeout, Duration::from_millis(2500));
        assert_eq!(options.user_agent, "feed-test/1.0");
        // unset fields keep the library defaults
        assert_eq!(options.dialer_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_empty_config_matches_defaults() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.network, Network::Main);
        assert_eq!(config.feed.channel, FeedChannel::Mempool);
        assert_eq!(config.client.to_options(), ClientOptions::default());
    }

    #[test]
    fn test_default_settings_round_trip_options() {
        let settings = ClientSettings::default();

        assert_eq!(settings.retry_count, 2);
        assert_eq!(settings.back_off_initial_timeout_ms, 2);
        assert_eq!(settings.back_off_max_timeout_ms, 10);
        assert_eq!(settings.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(settings.to_options(), ClientOptions::default());
    }

    #[test]
    fn test_invalid_exponent_factor() {
        let result = Config::parse("[client]\nback_off_exponent_factor = 0.5\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_empty_user_agent() {
        let result = Config::parse("[client]\nuser_agent = \"  \"\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_unknown_network() {
        let result = Config::parse("network = \"regtest\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_feed_urls() {
        assert_eq!(
            FeedChannel::Mempool.url(),
            "wss://socket.whatsonchain.com/mempool"
        );
        assert_eq!(
            FeedChannel::BlockHeaders.url(),
            "wss://socket.whatsonchain.com/blockheaders"
        );
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/whatsonchain.toml");
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }
}
