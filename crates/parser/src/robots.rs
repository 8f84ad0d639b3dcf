use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use sitemapper_core::helpers::is_http_url;

// RFC 9309 spells it "Sitemap:" but "Site-map:" shows up in the wild too
static SITEMAP_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^site-?map:\s*(.+?)$").unwrap());

/// Extract sitemap URLs advertised by robots.txt, in first-seen order,
/// deduplicated. Crawling directives are ignored entirely.
pub(crate) fn sitemap_urls(content: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();

    for line in content.lines() {
        let Some(captures) = SITEMAP_LINE_RE.captures(line.trim()) else {
            continue;
        };
        let url = captures[1].to_string();

        if !is_http_url(&url) {
            warn!(url = %url, "sitemap URL in robots.txt doesn't look like an URL, skipping");
            continue;
        }
        if !urls.iter().any(|existing| existing == &url) {
            urls.push(url);
        }
    }

    urls
}
