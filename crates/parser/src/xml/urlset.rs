use tracing::warn;

use sitemapper_core::helpers::parse_iso8601_date;
use sitemapper_core::{
    ChangeFrequency, Sitemap, SitemapError, SitemapNewsStory, SitemapPage,
    SITEMAP_PAGE_DEFAULT_PRIORITY,
};

use super::{require_char_data, unescape_strip, XmlOutcome};

/// Up to 5 stock tickers are kept per news story.
const MAX_STOCK_TICKERS: usize = 5;

/// Raw properties collected for a single `<url>` entry while parsing.
#[derive(Default)]
struct PageRow {
    url: Option<String>,
    last_modified: Option<String>,
    change_frequency: Option<String>,
    priority: Option<String>,
    news_title: Option<String>,
    news_publish_date: Option<String>,
    news_publication_name: Option<String>,
    news_publication_language: Option<String>,
    news_access: Option<String>,
    news_genres: Option<String>,
    news_keywords: Option<String>,
    news_stock_tickers: Option<String>,
}

impl PageRow {
    /// Normalized sitemap page, or `None` if the entry never got a URL.
    fn into_page(self) -> Result<Option<SitemapPage>, SitemapError> {
        let Some(url) = unescape_strip_opt(&self.url) else {
            warn!("page URL is unset, dropping entry");
            return Ok(None);
        };

        let last_modified = match unescape_strip_opt(&self.last_modified) {
            Some(value) => Some(
                parse_iso8601_date(&value)
                    .map_err(|err| SitemapError::XmlParse(err.to_string()))?,
            ),
            None => None,
        };

        let change_frequency = unescape_strip_opt(&self.change_frequency).map(|value| {
            let value = value.to_lowercase();
            value.parse::<ChangeFrequency>().unwrap_or_else(|_| {
                warn!(value = %value, "invalid change frequency, defaulting to 'always'");
                ChangeFrequency::Always
            })
        });

        let priority = match unescape_strip_opt(&self.priority) {
            Some(value) => {
                let parsed: f64 = value.parse().map_err(|_| {
                    SitemapError::XmlParse(format!("invalid priority '{value}'"))
                })?;
                if (0.0..=1.0).contains(&parsed) {
                    parsed
                } else {
                    warn!(priority = %value, "priority is not within 0 and 1, using default");
                    SITEMAP_PAGE_DEFAULT_PRIORITY
                }
            }
            None => SITEMAP_PAGE_DEFAULT_PRIORITY,
        };

        let news_title = unescape_strip_opt(&self.news_title);
        let news_publish_date = match unescape_strip_opt(&self.news_publish_date) {
            Some(value) => Some(
                parse_iso8601_date(&value)
                    .map_err(|err| SitemapError::XmlParse(err.to_string()))?,
            ),
            None => None,
        };

        // A story is only attached when both of its required properties
        // were present
        let news_story = match (news_title, news_publish_date) {
            (Some(title), Some(publish_date)) => {
                let mut story = SitemapNewsStory::new(title, publish_date);
                story.publication_name = unescape_strip_opt(&self.news_publication_name);
                story.publication_language =
                    unescape_strip_opt(&self.news_publication_language);
                story.access = unescape_strip_opt(&self.news_access);
                story.genres = split_on_commas(&self.news_genres);
                story.keywords = split_on_commas(&self.news_keywords);
                story.stock_tickers = split_on_commas(&self.news_stock_tickers);
                story.stock_tickers.truncate(MAX_STOCK_TICKERS);
                Some(story)
            }
            _ => None,
        };

        Ok(Some(SitemapPage {
            url,
            priority,
            last_modified,
            change_frequency,
            news_story,
        }))
    }
}

fn unescape_strip_opt(value: &Option<String>) -> Option<String> {
    value.as_deref().and_then(unescape_strip)
}

fn split_on_commas(value: &Option<String>) -> Vec<String> {
    match unescape_strip_opt(value) {
        Some(value) => value.split(',').map(|part| part.trim().to_string()).collect(),
        None => Vec::new(),
    }
}

/// State machine for `<urlset>` documents.
pub(crate) struct UrlsetParser {
    current_page: Option<PageRow>,
    pages: Vec<PageRow>,
}

impl UrlsetParser {
    pub(crate) fn new() -> Self {
        Self {
            current_page: None,
            pages: Vec::new(),
        }
    }

    pub(crate) fn element_start(&mut self, name: &str) -> Result<(), SitemapError> {
        if name == "sitemap:url" {
            if self.current_page.is_some() {
                return Err(SitemapError::XmlParse(
                    "page is expected to be unset by <url>".to_string(),
                ));
            }
            self.current_page = Some(PageRow::default());
        }
        Ok(())
    }

    pub(crate) fn element_end(&mut self, name: &str, char_data: &str) -> Result<(), SitemapError> {
        if name == "sitemap:urlset" {
            return Ok(());
        }

        if name == "sitemap:url" {
            let Some(page) = self.current_page.take() else {
                return Err(SitemapError::XmlParse(
                    "page is expected to be set at the end of <url>".to_string(),
                ));
            };
            // Entries are deduplicated by URL
            if !self.pages.iter().any(|existing| existing.url == page.url) {
                self.pages.push(page);
            }
            return Ok(());
        }

        let Some(page) = self.current_page.as_mut() else {
            return Err(SitemapError::XmlParse(format!(
                "page is expected to be set at the end of <{name}>"
            )));
        };

        match name {
            "sitemap:loc" => {
                // Every entry must have <loc>
                require_char_data(name, char_data)?;
                page.url = Some(char_data.to_string());
            }
            // The elements below might be present with empty character data
            "sitemap:lastmod" => page.last_modified = Some(char_data.to_string()),
            "sitemap:changefreq" => page.change_frequency = Some(char_data.to_string()),
            "sitemap:priority" => page.priority = Some(char_data.to_string()),
            // news/publication/name
            "news:name" => page.news_publication_name = Some(char_data.to_string()),
            // news/publication/language
            "news:language" => page.news_publication_language = Some(char_data.to_string()),
            "news:publication_date" => page.news_publish_date = Some(char_data.to_string()),
            "news:title" => {
                // Every Google News entry must have <title>
                require_char_data(name, char_data)?;
                page.news_title = Some(char_data.to_string());
            }
            "news:access" => page.news_access = Some(char_data.to_string()),
            "news:genres" => page.news_genres = Some(char_data.to_string()),
            "news:keywords" => page.news_keywords = Some(char_data.to_string()),
            "news:stock_tickers" => page.news_stock_tickers = Some(char_data.to_string()),
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn finalize(self, url: &str) -> Result<XmlOutcome, SitemapError> {
        let mut pages = Vec::with_capacity(self.pages.len());
        for row in self.pages {
            if let Some(page) = row.into_page()? {
                pages.push(page);
            }
        }
        Ok(XmlOutcome::Pages(Sitemap::pages_xml(url, pages)))
    }
}
