use tracing::warn;

use sitemapper_core::helpers::is_http_url;

use super::unescape_strip;

/// State machine for `<sitemapindex>` documents: collects sub-sitemap
/// URLs for the fetcher to recurse into.
pub(crate) struct IndexXmlParser {
    sub_sitemap_urls: Vec<String>,
}

impl IndexXmlParser {
    pub(crate) fn new() -> Self {
        Self {
            sub_sitemap_urls: Vec::new(),
        }
    }

    pub(crate) fn element_end(&mut self, name: &str, char_data: &str) {
        if name != "sitemap:loc" {
            return;
        }
        match unescape_strip(char_data) {
            Some(url) if is_http_url(&url) => {
                if !self.sub_sitemap_urls.contains(&url) {
                    self.sub_sitemap_urls.push(url);
                }
            }
            _ => {
                warn!(url = %char_data.trim(), "sub-sitemap URL doesn't look like one, skipping");
            }
        }
    }

    pub(crate) fn finalize(self) -> Vec<String> {
        self.sub_sitemap_urls
    }
}

#[cfg(test)]
mod tests {
    use crate::xml::{parse, XmlOutcome};

    fn parse_index(content: &str) -> Vec<String> {
        match parse("http://example.com/sitemap_index.xml", content).unwrap() {
            XmlOutcome::Index { sub_sitemap_urls } => sub_sitemap_urls,
            _ => panic!("expected a sitemap index"),
        }
    }

    #[test]
    fn collects_sub_sitemap_urls_in_order() {
        let content = r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
    <sitemap>
        <loc>http://example.com/sitemap_pages.xml</loc>
        <lastmod>2017-01-01</lastmod>
    </sitemap>
    <sitemap>
        <loc>http://example.com/sitemap_news.xml</loc>
    </sitemap>
</sitemapindex>"#;
        assert_eq!(
            parse_index(content),
            vec![
                "http://example.com/sitemap_pages.xml",
                "http://example.com/sitemap_news.xml",
            ],
        );
    }

    #[test]
    fn deduplicates_and_skips_non_http_urls() {
        let content = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
    <sitemap><loc>http://example.com/a.xml</loc></sitemap>
    <sitemap><loc>http://example.com/a.xml</loc></sitemap>
    <sitemap><loc>ftp://example.com/b.xml</loc></sitemap>
    <sitemap><loc>not an URL</loc></sitemap>
    <sitemap><loc>http://example.com/c.xml</loc></sitemap>
</sitemapindex>"#;
        assert_eq!(
            parse_index(content),
            vec!["http://example.com/a.xml", "http://example.com/c.xml"],
        );
    }

    #[test]
    fn loc_urls_are_unescaped_and_trimmed() {
        let content = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
    <sitemap><loc>
        http://example.com/sitemap.xml?a=1&amp;b=2
    </loc></sitemap>
</sitemapindex>"#;
        assert_eq!(
            parse_index(content),
            vec!["http://example.com/sitemap.xml?a=1&b=2"],
        );
    }
}
