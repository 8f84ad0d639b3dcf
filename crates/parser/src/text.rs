use tracing::warn;

use sitemapper_core::helpers::is_http_url;
use sitemapper_core::{Sitemap, SitemapPage};

/// Parse a plain-text sitemap: one page URL per line, blank lines
/// skipped, duplicates dropped while preserving order.
pub(crate) fn parse(url: &str, content: &str) -> Sitemap {
    let mut pages: Vec<SitemapPage> = Vec::new();

    for line in content.lines() {
        let page_url = line.trim();
        if page_url.is_empty() {
            continue;
        }
        if !is_http_url(page_url) {
            warn!(url = %page_url, "page URL doesn't look like an URL, skipping");
            continue;
        }
        if !pages.iter().any(|page| page.url == page_url) {
            pages.push(SitemapPage::new(page_url));
        }
    }

    Sitemap::pages_text(url, pages)
}
