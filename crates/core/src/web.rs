use std::collections::HashMap;

use async_trait::async_trait;

/// HTTP status codes on which a request should be retried.
pub const RETRYABLE_HTTP_STATUS_CODES: [u16; 19] = [
    // Some servers return "400 Bad Request" initially but upon retry start
    // working again
    400,
    // Request Timeout
    408,
    // Too Many Requests: wait a bit and come back
    429,
    // (unofficial, nginx) Client Closed Request
    499,
    // Internal Server Error
    500,
    // Bad Gateway: upstream might reappear on a retry
    502,
    // Service Unavailable
    503,
    // Gateway Timeout
    504,
    // (unofficial) Bandwidth Limit Exceeded (Apache/cPanel)
    509,
    // (unofficial, Cloudflare) 520-527 + 530
    520, 521, 522, 523, 524, 525, 526, 527, 530,
    // (unofficial) Network read timeout error
    598,
];

pub fn is_retryable_status(status_code: u16) -> bool {
    RETRYABLE_HTTP_STATUS_CODES.contains(&status_code)
}

/// Successful HTTP response handed back by a web client.
#[derive(Debug, Clone)]
pub struct SuccessResponse {
    status_code: u16,
    status_message: String,
    headers: HashMap<String, String>,
    data: Vec<u8>,
}

impl SuccessResponse {
    pub fn new(
        status_code: u16,
        status_message: impl Into<String>,
        headers: HashMap<String, String>,
        data: Vec<u8>,
    ) -> Self {
        // Header lookup is case-insensitive; normalize keys once here
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        Self {
            status_code,
            status_message: status_message.into(),
            headers,
            data,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn header(&self, case_insensitive_name: &str) -> Option<&str> {
        self.headers
            .get(&case_insensitive_name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Raw body bytes, already truncated to the configured maximum.
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }
}

/// Error response: what went wrong and whether retrying makes sense.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    message: String,
    retryable: bool,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>, retryable: bool) -> Self {
        Self {
            message: message.into(),
            retryable,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn retryable(&self) -> bool {
        self.retryable
    }
}

/// Outcome of a single `WebClient::get` call.
#[derive(Debug, Clone)]
pub enum WebResponse {
    Success(SuccessResponse),
    Error(ErrorResponse),
}

/// Web client used by the sitemap fetcher. Implementations must be
/// shareable behind `&self`, so the response size cap uses interior
/// mutability.
#[async_trait]
pub trait WebClient: Send + Sync {
    /// Cap the number of body bytes `get` will return per response.
    fn set_max_response_data_length(&self, max_response_data_length: usize);

    /// Fetch a URL. Transport failures and non-2xx statuses come back as
    /// `WebResponse::Error`, never as a panic or a Rust error.
    async fn get(&self, url: &str) -> WebResponse;
}
