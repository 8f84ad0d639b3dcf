use tracing::warn;

use sitemapper_core::helpers::parse_rfc2822_date;
use sitemapper_core::{Sitemap, SitemapError, SitemapNewsStory, SitemapPage};

use super::{require_char_data, unescape_strip, XmlOutcome};

/// Raw properties collected for a single RSS `<item>` while parsing.
#[derive(Default)]
struct ItemRow {
    link: Option<String>,
    title: Option<String>,
    description: Option<String>,
    publication_date: Option<String>,
}

impl ItemRow {
    fn into_page(self) -> Result<Option<SitemapPage>, SitemapError> {
        let Some(link) = self.link.as_deref().and_then(unescape_strip) else {
            warn!("item link is unset, dropping entry");
            return Ok(None);
        };

        let title = self.title.as_deref().and_then(unescape_strip);
        let description = self.description.as_deref().and_then(unescape_strip);
        let Some(story_title) = title.or(description) else {
            warn!("both item title and description are unset, dropping entry");
            return Ok(None);
        };

        let publication_date = match self.publication_date.as_deref().and_then(unescape_strip) {
            Some(value) => Some(
                parse_rfc2822_date(&value)
                    .map_err(|err| SitemapError::XmlParse(err.to_string()))?,
            ),
            None => None,
        };

        let mut page = SitemapPage::new(link);
        // A story needs a publish date; undated items stay plain pages
        page.news_story =
            publication_date.map(|date| SitemapNewsStory::new(story_title, date));
        Ok(Some(page))
    }
}

/// State machine for RSS 2.0 documents.
///
/// <https://validator.w3.org/feed/docs/rss2.html>
pub(crate) struct RssParser {
    current_page: Option<ItemRow>,
    pages: Vec<ItemRow>,
}

impl RssParser {
    pub(crate) fn new() -> Self {
        Self {
            current_page: None,
            pages: Vec::new(),
        }
    }

    pub(crate) fn element_start(&mut self, name: &str) -> Result<(), SitemapError> {
        if name == "item" {
            if self.current_page.is_some() {
                return Err(SitemapError::XmlParse(
                    "page is expected to be unset by <item>".to_string(),
                ));
            }
            self.current_page = Some(ItemRow::default());
        }
        Ok(())
    }

    pub(crate) fn element_end(&mut self, name: &str, char_data: &str) -> Result<(), SitemapError> {
        // Elements outside <item> (channel metadata) are of no interest
        if self.current_page.is_none() {
            return Ok(());
        }

        if name == "item" {
            if let Some(page) = self.current_page.take() {
                self.pages.push(page);
            }
            return Ok(());
        }

        let Some(page) = self.current_page.as_mut() else {
            return Ok(());
        };
        match name {
            "link" => {
                // Every entry must have <link>
                require_char_data(name, char_data)?;
                page.link = Some(char_data.to_string());
            }
            "title" => {
                // Title (if present) can't be empty
                require_char_data(name, char_data)?;
                page.title = Some(char_data.to_string());
            }
            "description" => {
                // Description (if present) can't be empty
                require_char_data(name, char_data)?;
                page.description = Some(char_data.to_string());
            }
            // Might be present with empty character data
            "pubDate" => page.publication_date = Some(char_data.to_string()),
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
        Ok(XmlOutcome::Pages(Sitemap::pages_rss(url, pages)))
    }
}
