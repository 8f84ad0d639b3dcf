use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{info, warn};

use sitemapper_core::helpers::is_http_url;
use sitemapper_core::{Sitemap, SitemapError, WebClient, WebResponse};

use crate::encoding::ungzipped_response_content;
use crate::retry::get_with_retry;
use crate::xml::XmlOutcome;
use crate::{robots, text, xml};

/// Max. uncompressed sitemap size. The sitemap spec allows up to 50 MB
/// but plenty of sites exceed it, so go for the full 100 MB.
pub const MAX_SITEMAP_SIZE: usize = 100 * 1024 * 1024;

/// Max. recursion level when descending into sub-sitemaps.
pub const MAX_RECURSION_LEVEL: u32 = 10;

const RETRY_COUNT: u32 = 5;
const SLEEP_BETWEEN_RETRIES: Duration = Duration::from_secs(1);

/// Fetch a single sitemap URL and parse it into a [`Sitemap`], recursing
/// into any sub-sitemaps it references.
///
/// Returns `Err` for invalid input (a non-HTTP(S) URL, or a recursion
/// level past the cap) and for structural XML errors surfacing from the
/// top-level document; failures inside sub-sitemaps are contained in the
/// tree as `Invalid` entries so one bad URL cannot mask pages from its
/// siblings.
pub async fn fetch_sitemap(
    url: &str,
    recursion_level: u32,
    web_client: &dyn WebClient,
) -> Result<Sitemap, SitemapError> {
    if recursion_level > MAX_RECURSION_LEVEL {
        return Err(SitemapError::InvalidInput(format!(
            "recursion level exceeded {MAX_RECURSION_LEVEL} for URL {url}"
        )));
    }
    if !is_http_url(url) {
        return Err(SitemapError::InvalidInput(format!(
            "URL {url} is not a HTTP(s) URL"
        )));
    }

    web_client.set_max_response_data_length(MAX_SITEMAP_SIZE);

    info!(url = %url, level = recursion_level, "fetching sitemap");
    let response = get_with_retry(url, web_client, RETRY_COUNT, SLEEP_BETWEEN_RETRIES).await;
    let success = match response {
        WebResponse::Success(success) => success,
        WebResponse::Error(err) => {
            return Ok(Sitemap::invalid(
                url,
                format!("unable to fetch sitemap from {url}: {}", err.message()),
            ));
        }
    };

    let content = ungzipped_response_content(url, &success);

    // MIME types returned in Content-Type are unpredictable, so peek into
    // the content instead
    let head: String = content.chars().take(20).collect();
    if head.trim().starts_with('<') {
        // XML sitemap; the specific kind is determined by its root element
        match xml::parse(url, &content)? {
            XmlOutcome::Pages(sitemap) => Ok(sitemap),
            XmlOutcome::Index { sub_sitemap_urls } => {
                let sub_sitemaps =
                    fetch_sub_sitemaps(sub_sitemap_urls, recursion_level + 1, web_client).await;
                Ok(Sitemap::index_xml(url, sub_sitemaps))
            }
            XmlOutcome::Unsupported { reason } => Ok(Sitemap::invalid(url, reason)),
        }
    } else if url.ends_with("/robots.txt") {
        // robots.txt references sitemaps at the same level; it does not
        // consume a recursion level
        let sub_sitemap_urls = robots::sitemap_urls(&content);
        let sub_sitemaps = fetch_sub_sitemaps(sub_sitemap_urls, recursion_level, web_client).await;
        Ok(Sitemap::index_robots_txt(url, sub_sitemaps))
    } else {
        Ok(text::parse(url, &content))
    }
}

async fn fetch_sub_sitemaps(
    urls: Vec<String>,
    recursion_level: u32,
    web_client: &dyn WebClient,
) -> Vec<Sitemap> {
    let mut sub_sitemaps = Vec::with_capacity(urls.len());
    for sub_sitemap_url in urls {
        // The URL might be invalid, or the recursion limit might have been
        // reached; a failing sub-sitemap must not take its siblings with it
        let sub_sitemap =
            match fetch_sitemap_boxed(&sub_sitemap_url, recursion_level, web_client).await {
                Ok(sitemap) => sitemap,
                Err(err) => {
                    warn!(url = %sub_sitemap_url, error = %err, "unable to add sub-sitemap");
                    Sitemap::invalid(
                        &sub_sitemap_url,
                        format!("unable to add sub-sitemap from URL {sub_sitemap_url}: {err}"),
                    )
                }
            };
        sub_sitemaps.push(sub_sitemap);
    }
    sub_sitemaps
}

// Type-erased indirection that lets the async fetch recurse
fn fetch_sitemap_boxed<'a>(
    url: &'a str,
    recursion_level: u32,
    web_client: &'a dyn WebClient,
) -> Pin<Box<dyn Future<Output = Result<Sitemap, SitemapError>> + Send + 'a>> {
    Box::pin(fetch_sitemap(url, recursion_level, web_client))
}
