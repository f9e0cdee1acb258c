//! Resilient document fetching: bounded retries with exponential backoff over a transport seam.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::{Client, Proxy};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Browser-like identity sent when no user agent is configured.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
const MAX_REDIRECTS: usize = 5;

/// Retry and transport settings for a [`Fetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Per-request timeout, covering connect and body.
    pub timeout: Duration,
    /// Total attempts per URL; zero still makes one attempt.
    pub max_retries: u32,
    /// Delay before the second attempt; doubled before each later one.
    pub backoff_factor: Duration,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Proxy URLs keyed by scheme (`http`, `https`) or `all`.
    pub proxies: BTreeMap<String, String>,
    /// End the attempt loop on the first 4xx instead of retrying it.
    pub fail_fast_on_client_error: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            backoff_factor: Duration::from_millis(500),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxies: BTreeMap::new(),
            fail_fast_on_client_error: false,
        }
    }
}

impl FetchConfig {
    /// Attempts actually made per URL.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

/// Status and decoded body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code after redirects.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl TransportResponse {
    /// Builds a response from its parts.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Failures below the HTTP status layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response within the configured timeout.
    #[error("request timed out")]
    Timeout,
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The response body could not be read or decoded.
    #[error("unreadable response body: {0}")]
    Body(String),
    /// Any other request failure.
    #[error("request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

/// Network seam: one GET per call. Implementations are shared by every worker.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a GET for `url`.
    async fn get(&self, url: &str) -> Result<TransportResponse, TransportError>;
}

/// [`Transport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds the client from `config`.
    ///
    /// Only the proxies listed in `config` are used; proxy environment variables are ignored.
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE),
        );

        let mut builder = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(config.timeout)
            .no_proxy();

        for (scheme, target) in &config.proxies {
            let proxy = match scheme.as_str() {
                "http" => Proxy::http(target.as_str()),
                "https" => Proxy::https(target.as_str()),
                "all" => Proxy::all(target.as_str()),
                other => {
                    warn!(scheme = other, "ignoring proxy entry with unknown scheme");
                    continue;
                }
            };
            match proxy {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(err) => warn!(%scheme, %target, error = %err, "ignoring malformed proxy entry"),
            }
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, TransportError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}

/// Why a single attempt produced no document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connect failure, timeout or unreadable body.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// 5xx response.
    #[error("server error: HTTP {status}")]
    Server {
        /// Response status.
        status: u16,
    },
    /// 4xx response.
    #[error("client error: HTTP {status}")]
    Client {
        /// Response status.
        status: u16,
    },
}

/// Every attempt for a URL failed.
#[derive(Debug, Error)]
#[error("no document for {url} after {attempts} attempt(s): {last_error}")]
pub struct NoDocument {
    /// URL that was requested.
    pub url: String,
    /// Attempts made.
    pub attempts: u32,
    /// Failure of the final attempt.
    pub last_error: FetchError,
}

/// Retrieves document text, retrying transient failures with exponential backoff.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    config: FetchConfig,
}

impl Fetcher {
    /// Fetcher over an arbitrary transport.
    pub fn new(transport: Arc<dyn Transport>, config: FetchConfig) -> Self {
        Self { transport, config }
    }

    /// Fetcher over a [`HttpTransport`] built from `config`.
    pub fn http(config: FetchConfig) -> Result<Self, reqwest::Error> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(Arc::new(transport), config))
    }

    /// Returns the body of the first successful attempt.
    ///
    /// Failed attempts wait `backoff_factor`, then twice that, and so on. No wait follows the
    /// final attempt.
    pub async fn fetch(&self, url: &str) -> Result<String, NoDocument> {
        let max_attempts = self.config.max_attempts();
        let mut delay = self.config.backoff_factor;
        let mut attempt = 0;

        loop {
            attempt += 1;
            info!(url, attempt, max_attempts, "fetching");
            let err = match self.attempt(url).await {
                Ok(body) => return Ok(body),
                Err(err) => err,
            };
            warn!(url, attempt, error = %err, "fetch attempt failed");

            let fail_fast =
                self.config.fail_fast_on_client_error && matches!(err, FetchError::Client { .. });
            if attempt >= max_attempts || fail_fast {
                error!(url, attempts = attempt, error = %err, "giving up");
                return Err(NoDocument {
                    url: url.to_string(),
                    attempts: attempt,
                    last_error: err,
                });
            }

            sleep(delay).await;
            delay = delay.saturating_mul(2);
        }
    }

    async fn attempt(&self, url: &str) -> Result<String, FetchError> {
        let response = self.transport.get(url).await?;
        match response.status {
            status @ 500.. => Err(FetchError::Server { status }),
            status @ 400..=499 => Err(FetchError::Client { status }),
            _ => Ok(response.body),
        }
    }
}
