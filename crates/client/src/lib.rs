//! reqwest-based default implementation of the `WebClient` contract.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use tracing::{debug, warn};

use sitemapper_core::{
    is_retryable_status, ErrorResponse, SuccessResponse, WebClient, WebResponse,
};

const USER_AGENT: &str = "sitemapper/0.1.0";

/// Some web servers generate huge sitemaps on the fly, so the default
/// request timeout is rather big.
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default web client used by the sitemap fetcher.
///
/// Timeouts are reported as retryable errors; all other transport errors
/// (redirect loops, TLS failures, refused connections) are not. Non-2xx
/// statuses are mapped through the shared retryable status set.
pub struct HttpWebClient {
    client: reqwest::Client,
    timeout: Duration,
    // 0 means "no cap configured"
    max_response_data_length: AtomicUsize,
}

impl HttpWebClient {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Build on top of a preconfigured reqwest client, e.g. one with a
    /// proxy or custom TLS setup.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: HTTP_REQUEST_TIMEOUT,
            max_response_data_length: AtomicUsize::new(0),
        }
    }

    /// Override the per-request timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}

impl Default for HttpWebClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebClient for HttpWebClient {
    fn set_max_response_data_length(&self, max_response_data_length: usize) {
        self.max_response_data_length
            .store(max_response_data_length, Ordering::Relaxed);
    }

    async fn get(&self, url: &str) -> WebResponse {
        debug!(url = %url, "fetching");

        let result = self
            .client
            .get(url)
            .timeout(self.timeout)
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await;

        let mut response = match result {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                warn!(url = %url, error = %err, "request timed out");
                return WebResponse::Error(ErrorResponse::new(err.to_string(), true));
            }
            Err(err) => {
                // Other transport errors, e.g. redirect loops
                warn!(url = %url, error = %err, "request failed");
                return WebResponse::Error(ErrorResponse::new(err.to_string(), false));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let message = format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            );
            return WebResponse::Error(ErrorResponse::new(
                message,
                is_retryable_status(status.as_u16()),
            ));
        }

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_string(), value.to_string());
            }
        }

        // Stream the body so the cap cuts the download short instead of
        // buffering the whole response first
        let max_length = self.max_response_data_length.load(Ordering::Relaxed);
        let mut data = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    data.extend_from_slice(&chunk);
                    if max_length > 0 && data.len() >= max_length {
                        data.truncate(max_length);
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(url = %url, error = %err, "reading response body failed");
                    return WebResponse::Error(ErrorResponse::new(
                        err.to_string(),
                        err.is_timeout(),
                    ));
                }
            }
        }

        WebResponse::Success(SuccessResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            headers,
            data,
        ))
    }
}
