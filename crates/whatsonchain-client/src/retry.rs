//! Exponential backoff with jitter, plugged into the HTTP middleware stack.

use crate::options::ClientOptions;
use rand::Rng;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryDecision, RetryPolicy, RetryTransientMiddleware};
use std::time::{Duration, SystemTime};
use tracing::debug;


/// Retry policy derived from [`ClientOptions`].
///
/// Holds no state between requests: the delay for a retry depends only on
/// how many retries already happened and on the options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    max_retries: u32,
    exponent_factor: f64,
    initial_timeout: Duration,
    max_jitter: Duration,
    max_timeout: Duration,
}

impl BackoffPolicy {
    /// Creates a policy from client options.
    #[must_use]
    pub fn from_options(options: &ClientOptions) -> Self {
        Self {
            max_retries: options.request_retry_count,
            exponent_factor: options.back_off_exponent_factor,
            initial_timeout: options.back_off_initial_timeout,
            max_jitter: options.back_off_maximum_jitter_interval,
            max_timeout: options.back_off_max_timeout,
        }
    }

    /// Number of retries allowed after the first attempt.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Backoff before retry number `attempt` (zero based), without jitter.
    ///
    /// `initial * factor^attempt`, capped at the maximum timeout.
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let nanos = (self.initial_timeout.as_nanos() as f64 * self.exponent_factor.powi(exponent))
            .round();

        if !nanos.is_finite() || nanos >= self.max_timeout.as_nanos() as f64 {
            self.max_timeout
        } else {
            Duration::from_nanos(nanos.max(0.0) as u64)
        }
    }

    /// Backoff before retry number `attempt` with the given jitter added.
    ///
    /// The result never exceeds the maximum timeout.
    #[must_use]
    pub fn delay(&self, attempt: u32, jitter: Duration) -> Duration {
        self.base_delay(attempt)
            .saturating_add(jitter.min(self.max_jitter))
            .min(self.max_timeout)
    }

    /// Draws a jitter sample in `[0, max_jitter]`.
    fn sample_jitter(&self) -> Duration {
        let max_nanos = u64::try_from(self.max_jitter.as_nanos()).unwrap_or(u64::MAX);
        if max_nanos == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(rand::rng().random_range(0..=max_nanos))
    }
}

impl RetryPolicy for BackoffPolicy {
    fn should_retry(&self, _request_start_time: SystemTime, n_past_retries: u32) -> RetryDecision {
        if n_past_retries >= self.max_retries {
            return RetryDecision::DoNotRetry;
        }

        let wait = self.delay(n_past_retries, self.sample_jitter());
        debug!(
            retry = n_past_retries + 1,
            max_retries = self.max_retries,
            wait_ms = wait.as_millis() as u64,
            "retrying request"
        );

        RetryDecision::Retry {
            execute_after: SystemTime::now() + wait,
        }
    }
}

/// Wraps `base_client` in the middleware stack described by `options`.
///
/// A retry count of zero yields a stack without the retry layer, so every
/// request is attempted exactly once.
pub fn build_http_client(
    options: &ClientOptions,
    base_client: reqwest::Client,
) -> ClientWithMiddleware {
    if !options.retries_enabled() {
        return ClientBuilder::new(base_client).build();
    }

    let policy = BackoffPolicy::from_options(options);
    ClientBuilder::new(base_client)
        .with(RetryTransientMiddleware::new_with_policy(policy))
        .build()
}
