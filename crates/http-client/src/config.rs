//! Tunables for the polite fetcher.

use std::time::Duration;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("lbxd-recs/", env!("CARGO_PKG_VERSION"));

/// Fetcher configuration.
///
/// Defaults: 250ms pause after each successful fetch, at most 100 open
/// connections, 3 retries with 0.5s exponential backoff and a 10s timeout.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Pause observed by the caller after every successful fetch
    pub request_delay: Duration,
    /// Ceiling on concurrently open connections; extra requests queue
    pub pool_size: usize,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    /// Backoff before retry `n` is `backoff_factor * 2^(n-1)`
    pub backoff_factor: Duration,
    /// Whole-request timeout
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_millis(250),
            pool_size: 100,
            max_retries: 3,
            backoff_factor: Duration::from_millis(500),
            timeout: Duration::from_secs(10),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Configure the connection ceiling (clamped to at least 1)
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size.max(1);
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_backoff_factor(mut self, factor: Duration) -> Self {
        self.backoff_factor = factor;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sleep before the given retry (1-based): 0.5s, 1s, 2s, ... by default.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.backoff_factor.saturating_mul(1u32 << exponent)
    }
}
