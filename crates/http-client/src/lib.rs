//! Polite HTTP client for scraping the origin site.
//!
//! This crate provides the only network access in the workspace. It handles:
//! - A connection ceiling: requests beyond `pool_size` queue instead of failing
//! - Retries of transient failures (timeouts, resets, 500/502/503/504) with
//!   exponential backoff, using only idempotent GETs
//! - A per-request pause after each successful fetch, so concurrent callers
//!   pace themselves independently rather than behind a global lock
//! - Cooperative cancellation: once the token fires no new request is sent
//!
//! Crawlers depend on the [`PageFetcher`] trait rather than on [`Fetcher`]
//! directly, so they can be exercised against canned pages in tests.

pub mod config;
pub mod error;

pub use config::{FetchConfig, USER_AGENT};
pub use error::{FetchError, FetchErrorKind};

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Anything that can turn a URL into HTML text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Rate-limited, retrying HTTP GET client.
///
/// Cloning is cheap and clones share the connection pool, the connection
/// ceiling and the cancellation token. Create one per run and pass it to
/// every crawler.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl Fetcher {
    /// Build a fetcher from the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let pool_size = config.pool_size.max(1);
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .pool_max_idle_per_host(pool_size)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            config,
            permits: Arc::new(Semaphore::new(pool_size)),
            cancel: CancellationToken::new(),
        })
    }

    /// Stop issuing requests once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Fetch `url` and return its body as text.
    ///
    /// Transient failures are retried up to `max_retries` times. Permanent
    /// failures (4xx and friends) are returned immediately. After a success
    /// the caller is held for `request_delay` before the body is returned.
    pub async fn get_html(&self, url: &str) -> Result<String, FetchError> {
        let mut retry = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                return Err(FetchError::Cancelled {
                    url: url.to_string(),
                });
            }

            match self.attempt(url).await {
                Ok(body) => {
                    tokio::time::sleep(self.config.request_delay).await;
                    return Ok(body);
                }
                Err(err) if err.is_transient() && retry < self.config.max_retries => {
                    retry += 1;
                    let backoff = self.config.backoff_delay(retry);
                    warn!(
                        "{} (retry {}/{}, backing off {:.2}s)",
                        err,
                        retry,
                        self.config.max_retries,
                        backoff.as_secs_f64()
                    );

                    tokio::select! {
                        _ = self.cancel.cancelled() => {
                            return Err(FetchError::Cancelled { url: url.to_string() });
                        }
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
                Err(err) => {
                    if err.is_transient() {
                        error!("Giving up after {} retries: {}", retry, err);
                    }
                    return Err(err);
                }
            }
        }
    }

    /// One GET, holding a connection permit for its whole lifetime.
    async fn attempt(&self, url: &str) -> Result<String, FetchError> {
        // A request queued behind the ceiling must not go out after cancellation
        let _permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(FetchError::Cancelled { url: url.to_string() });
            }
            permit = self.permits.acquire() => permit.map_err(|_| FetchError::Cancelled {
                url: url.to_string(),
            })?,
        };

        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))
    }
}

#[async_trait]
impl PageFetcher for Fetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.get_html(url).await
    }
}
