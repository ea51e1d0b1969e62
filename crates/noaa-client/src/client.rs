//! Retrying HTTP fetcher for the upstream API.

use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, warn};

use tide_common::{TideError, TideResult};

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct HttpClientOptions {
    /// Base URL prepended to request paths. Empty means paths are full URLs.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after the initial attempt, for 5xx and transport errors only.
    pub max_retries: u32,
    /// First retry delay; doubles per attempt.
    pub initial_backoff: Duration,
}

impl Default for HttpClientOptions {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

/// HTTP client with bounded retries and typed upstream errors.
pub struct HttpClient {
    base_url: String,
    client: reqwest::Client,
    max_retries: u32,
    initial_backoff: Duration,
}

impl HttpClient {
    pub fn new(options: HttpClientOptions) -> TideResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| TideError::Internal(format!("building HTTP client: {e}")))?;

        Ok(Self {
            base_url: options.base_url,
            client,
            max_retries: options.max_retries,
            initial_backoff: options.initial_backoff,
        })
    }

    /// Issue a GET and return the raw body.
    ///
    /// 4xx responses fail immediately; 5xx and transport errors are retried
    /// with exponential backoff until `max_retries` is exhausted.
    pub async fn get(&self, path: &str) -> TideResult<Bytes> {
        let url = if self.base_url.is_empty() {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        };

        let mut retries = 0;
        let mut delay = self.initial_backoff;

        loop {
            debug!(url = %url, retries, "GET request");

            let error = match self.client.get(&url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.bytes().await.map_err(|e| {
                            TideError::upstream(
                                status.as_u16(),
                                format!("reading response body: {e}"),
                            )
                        });
                    }

                    let error = TideError::upstream(
                        status.as_u16(),
                        format!("GET {url} returned {status}"),
                    );
                    if status.is_client_error() {
                        return Err(error);
                    }
                    error
                }
                Err(e) if e.is_timeout() => {
                    TideError::upstream(None, format!("GET {url} timed out: {e}"))
                }
                Err(e) => TideError::upstream(None, format!("GET {url} failed: {e}")),
            };

            retries += 1;
            if retries > self.max_retries {
                return Err(error);
            }

            warn!(
                url = %url,
                retry = retries,
                max_retries = self.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Upstream request failed, retrying"
            );

            tokio::time::sleep(delay).await;
            delay *= 2;
        }
    }
}
