use std::time::Duration;

use tracing::{debug, info, warn};

use sitemapper_core::{WebClient, WebResponse};

/// Fetch a URL, retrying on retryable errors with a fixed sleep between
/// attempts. Returns the last error response once attempts are exhausted.
pub async fn get_with_retry(
    url: &str,
    web_client: &dyn WebClient,
    retry_count: u32,
    sleep_between_retries: Duration,
) -> WebResponse {
    let attempts = retry_count.max(1);
    let mut attempt = 1;

    loop {
        debug!(url = %url, attempt, "fetching URL");
        let response = web_client.get(url).await;

        match &response {
            WebResponse::Success(_) => return response,
            WebResponse::Error(err) => {
                warn!(url = %url, error = %err.message(), "request failed");

                if !err.retryable() {
                    info!(url = %url, "not retrying");
                    return response;
                }
                if attempt >= attempts {
                    info!(url = %url, "giving up");
                    return response;
                }
            }
        }

        attempt += 1;
        tokio::time::sleep(sleep_between_retries).await;
    }
}
