//! Rate-limited, retrying HTTP fetch engine shared by every source adapter.
//!
//! ### Pacing
//! - Each [`Fetcher`] owns one [`RateLimiter`]; consecutive request starts are
//!   at least `rate_limit` apart, including retries of the same URL.
//!
//! ### Retries
//! - Non-2xx statuses and transport errors count as failed attempts.
//! - `max_retries` is the total attempt count.
//! - After failed attempt `n` the fetcher waits `n` seconds before the next one.
//!
//! ### Headers
//! - The configured User-Agent goes on every request; caller headers are merged
//!   on top and win on conflict.

pub mod error;
pub mod rate_limit;
pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ficrecs_core::ScraperSettings;

pub use error::{AttemptError, FetchError};
pub use rate_limit::RateLimiter;
pub use self::url::{normalize_url, resolve_href};

/// Wait added per failed attempt number before the next attempt.
pub const RETRY_BACKOFF_STEP: Duration = Duration::from_millis(1000);

/// Configuration for one adapter's fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Minimum spacing between request starts (default: 2s)
    pub rate_limit: Duration,

    /// Total attempts per URL (default: 3)
    pub max_retries: u32,

    /// User agent string sent on every request
    pub user_agent: String,

    /// Recorded policy flag; robots.txt is not fetched
    pub respect_robots: bool,

    /// Per-request timeout (default: 20s)
    pub timeout: Duration,
}

impl FetchConfig {
    /// Build a fetch config from a source's effective scraper settings.
    pub fn from_settings(settings: &ScraperSettings, timeout: Duration) -> Self {
        Self {
            rate_limit: Duration::from_millis(settings.rate_limit_ms),
            max_retries: settings.max_retries,
            user_agent: settings.user_agent.clone(),
            respect_robots: settings.respect_robots,
            timeout,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from_settings(&ScraperSettings::default(), Duration::from_millis(20_000))
    }
}

/// Response from a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: header::HeaderMap,
    /// Response body bytes
    pub bytes: Bytes,
    /// Time taken by the attempt in milliseconds
    pub fetch_ms: u64,
}

impl FetchResponse {
    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// One HTTP GET, with no pacing or retry policy of its own.
///
/// Any status is returned as a response; only transport failures are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url, headers: &HeaderMap) -> Result<FetchResponse, AttemptError>;
}

/// Transport backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| FetchError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url, headers: &HeaderMap) -> Result<FetchResponse, AttemptError> {
        let start = Instant::now();
        let response = self.http.get(url.clone()).headers(headers.clone()).send().await?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;

        Ok(FetchResponse {
            url: url.clone(),
            final_url,
            status,
            headers,
            bytes,
            fetch_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Paced, retrying fetcher owned by a single adapter.
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    config: FetchConfig,
    limiter: RateLimiter,
    base_headers: HeaderMap,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("config", &self.config)
            .field("limiter", &self.limiter)
            .finish()
    }
}

impl Fetcher {
    /// Create a fetcher that talks HTTP through reqwest.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Self::with_transport(Arc::new(transport), config)
    }

    /// Create a fetcher over any transport.
    pub fn with_transport(transport: Arc<dyn Transport>, config: FetchConfig) -> Result<Self, FetchError> {
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| FetchError::Config(format!("invalid user agent: {e}")))?;
        let mut base_headers = HeaderMap::new();
        base_headers.insert(header::USER_AGENT, user_agent);

        if !config.respect_robots {
            tracing::debug!(user_agent = %config.user_agent, "robots.txt policy disabled for this fetcher");
        }

        Ok(Self { transport, limiter: RateLimiter::new(config.rate_limit), config, base_headers })
    }

    /// Fetch a URL with the configured headers only.
    pub async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.fetch_with_headers(url, HeaderMap::new()).await
    }

    /// Fetch a URL, merging `headers` over the configured ones.
    ///
    /// Returns the first 2xx response. Fails with [`FetchError::Exhausted`]
    /// once `max_retries` attempts have failed.
    pub async fn fetch_with_headers(&self, url: &str, headers: HeaderMap) -> Result<FetchResponse, FetchError> {
        let url = normalize_url(url)?;
        let headers = self.merge_headers(headers);
        let attempts = self.config.max_retries.max(1);

        let mut last_error = AttemptError::Timeout;
        for attempt in 1..=attempts {
            self.limiter.acquire().await;

            match self.transport.get(&url, &headers).await {
                Ok(response) if response.status.is_success() => {
                    tracing::debug!(
                        url = %url,
                        attempt,
                        status = response.status.as_u16(),
                        fetch_ms = response.fetch_ms,
                        bytes = response.bytes.len(),
                        "fetched"
                    );
                    return Ok(response);
                }
                Ok(response) => last_error = AttemptError::Status { status: response.status.as_u16() },
                Err(e) => last_error = e,
            }

            tracing::warn!(url = %url, attempt, max = attempts, error = %last_error, "fetch attempt failed");

            if attempt < attempts {
                tokio::time::sleep(RETRY_BACKOFF_STEP * attempt).await;
            }
        }

        Err(FetchError::Exhausted { url: url.to_string(), attempts, last: last_error })
    }

    fn merge_headers(&self, extra: HeaderMap) -> HeaderMap {
        let mut merged = self.base_headers.clone();
        merged.extend(extra);
        merged
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-process transport for exercising fetch policy and adapters.

    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use tokio::time::Instant as TokioInstant;

    /// One recorded request.
    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub url: String,
        pub at: TokioInstant,
        pub headers: HeaderMap,
    }

    /// Serves queued outcomes per URL, falling back to a default outcome.
    pub struct ScriptedTransport {
        routes: Mutex<HashMap<String, VecDeque<Result<(u16, String), AttemptError>>>>,
        fallback: Result<(u16, String), AttemptError>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedTransport {
        pub fn new(fallback: Result<(u16, String), AttemptError>) -> Self {
            Self { routes: Mutex::new(HashMap::new()), fallback, calls: Mutex::new(Vec::new()) }
        }

        pub fn ok() -> Self {
            Self::new(Ok((200, String::new())))
        }

        /// Queue an outcome for `url`; once a URL's queue drains, its last outcome repeats.
        pub fn route(self, url: &str, outcome: Result<(u16, String), AttemptError>) -> Self {
            self.routes
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default()
                .push_back(outcome);
            self
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, url: &Url, headers: &HeaderMap) -> Result<FetchResponse, AttemptError> {
            self.calls.lock().unwrap().push(RecordedCall {
                url: url.to_string(),
                at: TokioInstant::now(),
                headers: headers.clone(),
            });

            let outcome = {
                let mut routes = self.routes.lock().unwrap();
                match routes.get_mut(url.as_str()) {
                    Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
                    Some(queue) => queue.front().cloned().unwrap(),
                    None => self.fallback.clone(),
                }
            };

            let (status, body) = outcome?;
            Ok(FetchResponse {
                url: url.clone(),
                final_url: url.clone(),
                status: StatusCode::from_u16(status).unwrap(),
                headers: HeaderMap::new(),
                bytes: Bytes::from(body),
                fetch_ms: 0,
            })
        }
    }
}
