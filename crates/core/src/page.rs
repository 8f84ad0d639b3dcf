use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SitemapError;

/// Default page priority, as per the sitemap spec.
pub const SITEMAP_PAGE_DEFAULT_PRIORITY: f64 = 0.5;

/// Hint about how often a page changes, from `<changefreq>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFrequency::Always => "always",
            ChangeFrequency::Hourly => "hourly",
            ChangeFrequency::Daily => "daily",
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
            ChangeFrequency::Yearly => "yearly",
            ChangeFrequency::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeFrequency {
    type Err = SitemapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(ChangeFrequency::Always),
            "hourly" => Ok(ChangeFrequency::Hourly),
            "daily" => Ok(ChangeFrequency::Daily),
            "weekly" => Ok(ChangeFrequency::Weekly),
            "monthly" => Ok(ChangeFrequency::Monthly),
            "yearly" => Ok(ChangeFrequency::Yearly),
            "never" => Ok(ChangeFrequency::Never),
            other => Err(SitemapError::InvalidInput(format!(
                "unknown change frequency '{other}'"
            ))),
        }
    }
}

/// Single story derived from a Google News XML sitemap entry.
///
/// The news spec marks more properties as required, but in practice not
/// every website provides them; only `title` and `publish_date` are
/// guaranteed to be set here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapNewsStory {
    pub title: String,
    pub publish_date: DateTime<Utc>,
    pub publication_name: Option<String>,
    pub publication_language: Option<String>,
    pub access: Option<String>,
    pub genres: Vec<String>,
    pub keywords: Vec<String>,
    /// Up to 5 stock tickers that are the main subject of the story.
    pub stock_tickers: Vec<String>,
}

impl SitemapNewsStory {
    pub fn new(title: impl Into<String>, publish_date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            publish_date,
            publication_name: None,
            publication_language: None,
            access: None,
            genres: Vec::new(),
            keywords: Vec::new(),
            stock_tickers: Vec::new(),
        }
    }
}

/// Single page found in one of the sitemaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapPage {
    pub url: String,
    pub priority: f64,
    pub last_modified: Option<DateTime<Utc>>,
    pub change_frequency: Option<ChangeFrequency>,
    pub news_story: Option<SitemapNewsStory>,
}

impl SitemapPage {
    /// Page with just a URL, everything else at its default.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            priority: SITEMAP_PAGE_DEFAULT_PRIORITY,
            last_modified: None,
            change_frequency: None,
            news_story: None,
        }
    }
}
