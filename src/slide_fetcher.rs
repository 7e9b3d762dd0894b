//! Handles all interactions with the slides webhook.
//!
//! `SlideFetcher` issues the request for a day, validates the response and
//! retries network failures with exponential backoff. The HTTP call itself
//! sits behind [`SlideTransport`]; [`HttpTransport`] is the `reqwest` client
//! used in production.

use super::config::AppConfig;
use super::errors::FetchError;
use super::model::{Slide, WeekDay};
use log::{debug, error, info, trace, warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Status line and body of one webhook response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    /// Only read for successful responses.
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a single GET against the webhook.
///
/// Network failures are reported as [`FetchError::Connectivity`] or
/// [`FetchError::Aborted`]; any HTTP status, successful or not, is a response.
pub trait SlideTransport: Send + Sync + 'static {
    fn get(&self, url: &Url) -> impl Future<Output = Result<TransportResponse, FetchError>> + Send;
}

/// `reqwest`-backed transport with a per-request timeout.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    request_timeout: Duration,
}

impl HttpTransport {
    pub fn new(client: Client, request_timeout: Duration) -> Self {
        Self { client, request_timeout }
    }
}

impl SlideTransport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, FetchError> {
        trace!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| {
                error!("Request error fetching slides from {}: {}", url, e);
                FetchError::from(e)
            })?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let body = if status.is_success() {
            response.text().await.map_err(|e| {
                error!("Error reading slides body from {}: {}", url, e);
                FetchError::from(e)
            })?
        } else {
            String::new()
        };
        Ok(TransportResponse { status: status.as_u16(), status_text, body })
    }
}

/// Bounded exponential backoff for network failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based): `base_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, base_delay: Duration::from_millis(2000) }
    }
}

pub struct SlideFetcher<T> {
    transport: T,
    endpoint: Url,
    retry: RetryPolicy,
}

impl<T: SlideTransport> SlideFetcher<T> {
    pub fn new(transport: T, endpoint: Url, retry: RetryPolicy) -> Self {
        Self { transport, endpoint, retry }
    }

    pub fn from_config(transport: T, config: &AppConfig) -> Self {
        let retry = RetryPolicy { max_retries: config.max_retries, base_delay: config.retry_base_delay };
        Self::new(transport, config.endpoint_url.clone(), retry)
    }

    /// The endpoint with `day=<id>` appended to its query.
    pub fn request_url(&self, day: WeekDay) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("day", day.id());
        url
    }

    /// Fetches the slides published for `day`.
    ///
    /// Network failures are retried up to `max_retries` times; HTTP errors and
    /// malformed bodies are returned at once. Cancelling `cancel` ends the
    /// fetch with [`FetchError::Superseded`], including during a backoff wait.
    #[must_use = "fetching slides can fail; the Result must be handled"]
    pub async fn fetch(&self, day: WeekDay, cancel: &CancellationToken) -> Result<Vec<Slide>, FetchError> {
        let url = self.request_url(day);
        let mut attempt = 0;
        loop {
            debug!("Fetching slides for '{}' (attempt {})", day, attempt + 1);
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Fetch for '{}' superseded during request", day);
                    return Err(FetchError::Superseded);
                }
                result = self.fetch_once(&url) => result,
            };

            match result {
                Ok(slides) => {
                    info!("Fetched {} slide(s) for '{}'", slides.len(), day);
                    return Ok(slides);
                }
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    warn!("Fetch for '{}' failed: {}. Retrying in {:?} ({}/{})", day, e, delay, attempt + 1, self.retry.max_retries);
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            debug!("Fetch for '{}' superseded during backoff", day);
                            return Err(FetchError::Superseded);
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(e) => {
                    error!("Fetch for '{}' failed: {}", day, e);
                    return Err(e);
                }
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> Result<Vec<Slide>, FetchError> {
        let response = self.transport.get(url).await?;
        if !response.is_success() {
            return Err(FetchError::Api { status: response.status, status_text: response.status_text });
        }
        decode_slides(&response.body)
    }
}

/// Decodes a response body into slides.
///
/// The body must be a JSON array. Elements without string `id`, title and
/// `url` are dropped.
pub fn decode_slides(body: &str) -> Result<Vec<Slide>, FetchError> {
    let value: Value = serde_json::from_str(body).map_err(|e| FetchError::Format(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(FetchError::Format("expected a JSON array of slides".to_string()));
    };
    let total = items.len();
    let slides: Vec<Slide> = items.into_iter().filter_map(Slide::from_wire).collect();
    if slides.len() < total {
        warn!("Dropped {} malformed slide entr(ies) out of {}", total - slides.len(), total);
    }
    Ok(slides)
}
