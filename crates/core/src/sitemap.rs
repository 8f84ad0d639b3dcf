use serde::{Deserialize, Serialize};

use crate::page::SitemapPage;

/// One discovered sitemap: the URL it was fetched from plus what it
/// turned out to be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sitemap {
    pub url: String,
    pub kind: SitemapKind,
}

/// What a fetched sitemap document turned out to contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SitemapKind {
    /// Fetch or parse failed; contributes no pages.
    Invalid { reason: String },
    /// Leaf from an XML `<urlset>`.
    PagesXml { pages: Vec<SitemapPage> },
    /// Leaf from a plain-text URL list.
    PagesText { pages: Vec<SitemapPage> },
    /// Leaf from an RSS 2.0 `<channel>`.
    PagesRss { pages: Vec<SitemapPage> },
    /// Leaf from an Atom 0.3 / 1.0 `<feed>`.
    PagesAtom { pages: Vec<SitemapPage> },
    /// XML `<sitemapindex>` pointing at other sitemaps.
    IndexXml { sub_sitemaps: Vec<Sitemap> },
    /// `Sitemap:` lines found in robots.txt.
    IndexRobotsTxt { sub_sitemaps: Vec<Sitemap> },
    /// Synthetic root assembled for a whole website.
    IndexWebsite { sub_sitemaps: Vec<Sitemap> },
}

impl Sitemap {
    pub fn invalid(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: SitemapKind::Invalid {
                reason: reason.into(),
            },
        }
    }

    pub fn pages_xml(url: impl Into<String>, pages: Vec<SitemapPage>) -> Self {
        Self {
            url: url.into(),
            kind: SitemapKind::PagesXml { pages },
        }
    }

    pub fn pages_text(url: impl Into<String>, pages: Vec<SitemapPage>) -> Self {
        Self {
            url: url.into(),
            kind: SitemapKind::PagesText { pages },
        }
    }

    pub fn pages_rss(url: impl Into<String>, pages: Vec<SitemapPage>) -> Self {
        Self {
            url: url.into(),
            kind: SitemapKind::PagesRss { pages },
        }
    }

    pub fn pages_atom(url: impl Into<String>, pages: Vec<SitemapPage>) -> Self {
        Self {
            url: url.into(),
            kind: SitemapKind::PagesAtom { pages },
        }
    }

    pub fn index_xml(url: impl Into<String>, sub_sitemaps: Vec<Sitemap>) -> Self {
        Self {
            url: url.into(),
            kind: SitemapKind::IndexXml { sub_sitemaps },
        }
    }

    pub fn index_robots_txt(url: impl Into<String>, sub_sitemaps: Vec<Sitemap>) -> Self {
        Self {
            url: url.into(),
            kind: SitemapKind::IndexRobotsTxt { sub_sitemaps },
        }
    }

    pub fn index_website(url: impl Into<String>, sub_sitemaps: Vec<Sitemap>) -> Self {
        Self {
            url: url.into(),
            kind: SitemapKind::IndexWebsite { sub_sitemaps },
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self.kind, SitemapKind::Invalid { .. })
    }

    /// Reason the sitemap was deemed invalid, for `Invalid` sitemaps.
    pub fn reason(&self) -> Option<&str> {
        match &self.kind {
            SitemapKind::Invalid { reason } => Some(reason),
            _ => None,
        }
    }

    /// Pages stored directly in this sitemap, for leaf sitemaps.
    pub fn pages(&self) -> Option<&[SitemapPage]> {
        match &self.kind {
            SitemapKind::PagesXml { pages }
            | SitemapKind::PagesText { pages }
            | SitemapKind::PagesRss { pages }
            | SitemapKind::PagesAtom { pages } => Some(pages),
            _ => None,
        }
    }

    /// Sub-sitemaps linked from this sitemap, for index sitemaps.
    pub fn sub_sitemaps(&self) -> Option<&[Sitemap]> {
        match &self.kind {
            SitemapKind::IndexXml { sub_sitemaps }
            | SitemapKind::IndexRobotsTxt { sub_sitemaps }
            | SitemapKind::IndexWebsite { sub_sitemaps } => Some(sub_sitemaps),
            _ => None,
        }
    }

    /// Lazily walk every page of this sitemap and all linked sitemaps,
    /// depth-first, in document order. Invalid sitemaps yield nothing.
    pub fn all_pages(&self) -> AllPages<'_> {
        AllPages {
            sitemaps: vec![self],
            pages: [].iter(),
        }
    }
}

/// Depth-first page iterator over a sitemap tree.
pub struct AllPages<'a> {
    // Pending sitemaps, last one visited next; children are pushed in
    // reverse so document order is preserved.
    sitemaps: Vec<&'a Sitemap>,
    pages: std::slice::Iter<'a, SitemapPage>,
}

impl<'a> Iterator for AllPages<'a> {
    type Item = &'a SitemapPage;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(page) = self.pages.next() {
                return Some(page);
            }
            let sitemap = self.sitemaps.pop()?;
            match &sitemap.kind {
                SitemapKind::Invalid { .. } => {}
                SitemapKind::PagesXml { pages }
                | SitemapKind::PagesText { pages }
                | SitemapKind::PagesRss { pages }
                | SitemapKind::PagesAtom { pages } => {
                    self.pages = pages.iter();
                }
                SitemapKind::IndexXml { sub_sitemaps }
                | SitemapKind::IndexRobotsTxt { sub_sitemaps }
                | SitemapKind::IndexWebsite { sub_sitemaps } => {
                    self.sitemaps.extend(sub_sitemaps.iter().rev());
                }
            }
        }
    }
}
