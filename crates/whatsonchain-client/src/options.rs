//! Client options: retry policy, backoff and transport tuning.

use std::time::Duration;

#[cfg(test)]
mod tests;

/// User agent sent with every request unless overridden.
pub const DEFAULT_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), ": v", env!("CARGO_PKG_VERSION"));

/// Configuration for the HTTP client.
///
/// Built once and handed to [`WhatsOnChainClient::new`](crate::WhatsOnChainClient::new);
/// the client keeps its own copy, so later changes to the value have no
/// effect on an existing client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    /// Number of retries after the first attempt. Zero disables retrying.
    pub request_retry_count: u32,
    /// Multiplier applied to the backoff on every retry.
    pub back_off_exponent_factor: f64,
    /// Backoff before the first retry.
    pub back_off_initial_timeout: Duration,
    /// Upper bound of the random jitter added to each backoff.
    pub back_off_maximum_jitter_interval: Duration,
    /// Upper bound of a single backoff, jitter included.
    pub back_off_max_timeout: Duration,
    /// TCP keep-alive interval.
    pub dialer_keep_alive: Duration,
    /// TCP connect timeout.
    pub dialer_timeout: Duration,
    /// Timeout of a single request attempt.
    pub request_timeout: Duration,
    /// Wait for a `100 Continue` before sending a body.
    pub transport_expect_continue_timeout: Duration,
    /// How long an idle pooled connection is kept.
    pub transport_idle_timeout: Duration,
    /// Maximum idle pooled connections per host.
    pub transport_max_idle_connections: usize,
    /// TLS handshake timeout, added on top of the connect timeout.
    pub transport_tls_handshake_timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_retry_count: 2,
            back_off_exponent_factor: 2.0,
            back_off_initial_timeout: Duration::from_millis(2),
            back_off_maximum_jitter_interval: Duration::from_millis(2),
            back_off_max_timeout: Duration::from_millis(10),
            dialer_keep_alive: Duration::from_secs(20),
            dialer_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            transport_expect_continue_timeout: Duration::from_secs(3),
            transport_idle_timeout: Duration::from_secs(20),
            transport_max_idle_connections: 10,
            transport_tls_handshake_timeout: Duration::from_secs(5),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientOptions {
    /// Returns `true` when requests are retried at all.
    #[must_use]
    pub fn retries_enabled(&self) -> bool {
        self.request_retry_count > 0
    }

    /// Connect timeout handed to the transport: dial plus TLS handshake.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.dialer_timeout.saturating_add(self.transport_tls_handshake_timeout)
    }

    /// Builds a `reqwest::Client` tuned with these options.
    ///
    /// # Errors
    /// Returns error if the TLS backend cannot be initialised.
    pub fn build_transport(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout())
            .tcp_keepalive(self.dialer_keep_alive)
            .pool_idle_timeout(self.transport_idle_timeout)
            .pool_max_idle_per_host(self.transport_max_idle_connections)
            .timeout(self.request_timeout)
            .user_agent(self.user_agent.as_str())
            .build()
    }
}
