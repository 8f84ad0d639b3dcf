use tracing::warn;

use sitemapper_core::helpers::parse_rfc2822_date;
use sitemapper_core::{Sitemap, SitemapError, SitemapNewsStory, SitemapPage};

use super::{attribute, require_char_data, unescape_strip, XmlOutcome};

/// Raw properties collected for a single Atom `<entry>` while parsing.
#[derive(Default)]
struct EntryRow {
    link: Option<String>,
    title: Option<String>,
    description: Option<String>,
    publication_date: Option<String>,
}

impl EntryRow {
    fn into_page(self) -> Result<Option<SitemapPage>, SitemapError> {
        let Some(link) = self.link.as_deref().and_then(unescape_strip) else {
            warn!("entry link is unset, dropping entry");
            return Ok(None);
        };

        let title = self.title.as_deref().and_then(unescape_strip);
        let description = self.description.as_deref().and_then(unescape_strip);
        let Some(story_title) = title.or(description) else {
            warn!("both entry title and description are unset, dropping entry");
            return Ok(None);
        };

        // Atom 0.3 carries RFC 2822 dates, Atom 1.0 carries ISO 8601;
        // the lenient parser accepts both
        let publication_date = match self.publication_date.as_deref().and_then(unescape_strip) {
            Some(value) => Some(
                parse_rfc2822_date(&value)
                    .map_err(|err| SitemapError::XmlParse(err.to_string()))?,
            ),
            None => None,
        };

        let mut page = SitemapPage::new(link);
        page.news_story =
            publication_date.map(|date| SitemapNewsStory::new(story_title, date));
        Ok(Some(page))
    }
}

/// State machine for Atom 0.3 / 1.0 documents.
///
/// <https://www.ietf.org/rfc/rfc4287.txt>
pub(crate) struct AtomParser {
    current_page: Option<EntryRow>,
    pages: Vec<EntryRow>,
    last_link_rel_self_href: Option<String>,
}

impl AtomParser {
    pub(crate) fn new() -> Self {
        Self {
            current_page: None,
            pages: Vec::new(),
            last_link_rel_self_href: None,
        }
    }

    pub(crate) fn element_start(
        &mut self,
        name: &str,
        attributes: &[(String, String)],
    ) -> Result<(), SitemapError> {
        match name {
            "entry" => {
                if self.current_page.is_some() {
                    return Err(SitemapError::XmlParse(
                        "page is expected to be unset by <entry>".to_string(),
                    ));
                }
                self.current_page = Some(EntryRow::default());
            }
            "link" if self.current_page.is_some() => {
                // Prefer the rel="self" link (rel defaults to "self" when
                // absent), but keep the first link seen as a fallback
                let rel = attribute(attributes, "rel").unwrap_or("self");
                if rel.eq_ignore_ascii_case("self") || self.last_link_rel_self_href.is_none() {
                    self.last_link_rel_self_href =
                        attribute(attributes, "href").map(str::to_string);
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn element_end(&mut self, name: &str, char_data: &str) -> Result<(), SitemapError> {
        // Elements outside <entry> (feed metadata) are of no interest
        if self.current_page.is_none() {
            return Ok(());
        }

        if name == "entry" {
            let Some(mut page) = self.current_page.take() else {
                return Ok(());
            };
            if self
                .last_link_rel_self_href
                .as_deref()
                .is_some_and(|href| !href.is_empty())
            {
                page.link = self.last_link_rel_self_href.take();
                self.pages.push(page);
            }
            return Ok(());
        }

        let Some(page) = self.current_page.as_mut() else {
            return Ok(());
        };
        match name {
            "title" => {
                // Title (if present) can't be empty
                require_char_data(name, char_data)?;
                page.title = Some(char_data.to_string());
            }
            "tagline" | "summary" => {
                // Description (if present) can't be empty
                require_char_data(name, char_data)?;
                page.description = Some(char_data.to_string());
            }
            // Might be present with empty character data
            "issued" | "published" => page.publication_date = Some(char_data.to_string()),
            "updated" => {
                // Fallback when no <issued> or <published> was seen
                if page.publication_date.is_none() {
                    page.publication_date = Some(char_data.to_string());
                }
            }
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
        Ok(XmlOutcome::Pages(Sitemap::pages_atom(url, pages)))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::xml::{parse, XmlOutcome};

    fn parse_pages(content: &str) -> Vec<sitemapper_core::SitemapPage> {
        match parse("http://example.com/feed.atom", content).unwrap() {
            XmlOutcome::Pages(sitemap) => sitemap.pages().unwrap().to_vec(),
            _ => panic!("expected a pages sitemap"),
        }
    }

    #[test]
    fn parses_atom_10_entries() {
        let content = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Example feed</title>
    <link href="http://example.com/"/>
    <updated>2005-07-31T12:29:29Z</updated>
    <entry>
        <title>First story</title>
        <link href="http://example.com/news/first.html"/>
        <summary>Something happened.</summary>
        <published>2005-07-31T12:29:29Z</published>
    </entry>
    <entry>
        <title>Second story</title>
        <link href="http://example.com/news/second.html"/>
        <updated>2005-08-01T08:00:00Z</updated>
    </entry>
</feed>"#;
        let pages = parse_pages(content);
        assert_eq!(pages.len(), 2);

        assert_eq!(pages[0].url, "http://example.com/news/first.html");
        let story = pages[0].news_story.as_ref().unwrap();
        assert_eq!(story.title, "First story");
        assert_eq!(
            story.publish_date,
            Utc.with_ymd_and_hms(2005, 7, 31, 12, 29, 29).unwrap(),
        );

        // <updated> fills in when no <published> was seen
        let story = pages[1].news_story.as_ref().unwrap();
        assert_eq!(
            story.publish_date,
            Utc.with_ymd_and_hms(2005, 8, 1, 8, 0, 0).unwrap(),
        );
    }

    #[test]
    fn self_link_wins_over_alternate() {
        let content = r#"<feed xmlns="http://www.w3.org/2005/Atom">
    <entry>
        <title>T</title>
        <link rel="alternate" href="http://example.com/alt"/>
        <link rel="self" href="http://example.com/self"/>
    </entry>
</feed>"#;
        let pages = parse_pages(content);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].url, "http://example.com/self");
    }

    #[test]
    fn first_link_is_kept_when_no_self_link_exists() {
        let content = r#"<feed xmlns="http://www.w3.org/2005/Atom">
    <entry>
        <title>T</title>
        <link rel="alternate" href="http://example.com/first"/>
        <link rel="alternate" href="http://example.com/second"/>
    </entry>
</feed>"#;
        let pages = parse_pages(content);
        assert_eq!(pages[0].url, "http://example.com/first");
    }

    #[test]
    fn entry_without_link_is_dropped() {
        let content = r#"<feed xmlns="http://www.w3.org/2005/Atom">
    <entry><title>No link here</title></entry>
</feed>"#;
        assert!(parse_pages(content).is_empty());
    }

    #[test]
    fn atom_03_tagline_and_issued() {
        let content = r#"<feed version="0.3" xmlns="http://purl.org/atom/ns#">
    <entry>
        <link rel="alternate" type="text/html" href="http://example.com/older.html"/>
        <tagline>An older story</tagline>
        <issued>2004-05-08T12:00:00Z</issued>
    </entry>
</feed>"#;
        let pages = parse_pages(content);
        assert_eq!(pages.len(), 1);
        let story = pages[0].news_story.as_ref().unwrap();
        assert_eq!(story.title, "An older story");
        assert_eq!(
            story.publish_date,
            Utc.with_ymd_and_hms(2004, 5, 8, 12, 0, 0).unwrap(),
        );
    }
}
