//! Discover and parse the full set of sitemaps for a website.
//!
//! Given only a homepage URL, [`sitemap_tree_for_homepage`] locates
//! sitemaps via robots.txt and a list of well-known paths, follows
//! sitemap-index entries recursively, and parses each leaf according to
//! its actual format: XML Sitemap 0.9 (with the Google News extension),
//! RSS 2.0, Atom 0.3/1.0, or plain text. The result is a [`Sitemap`]
//! tree whose leaves carry [`SitemapPage`] records.
//!
//! A broken sub-sitemap never poisons the rest of the tree; it shows up
//! as an `Invalid` node and its siblings keep their pages.
//!
//! ```no_run
//! use sitemapper::sitemap_tree_for_homepage;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), sitemapper::SitemapError> {
//! let tree = sitemap_tree_for_homepage("https://www.example.com/", None).await?;
//! for page in tree.all_pages() {
//!     println!("{}", page.url);
//! }
//! # Ok(())
//! # }
//! ```

mod tree;

pub use tree::sitemap_tree_for_homepage;

pub use sitemapper_client::HttpWebClient;
pub use sitemapper_core::helpers;
pub use sitemapper_core::{
    is_retryable_status, AllPages, ChangeFrequency, ErrorResponse, Sitemap, SitemapError,
    SitemapKind, SitemapNewsStory, SitemapPage, SuccessResponse, WebClient, WebResponse,
    RETRYABLE_HTTP_STATUS_CODES, SITEMAP_PAGE_DEFAULT_PRIORITY,
};
pub use sitemapper_parser::{fetch_sitemap, get_with_retry, MAX_RECURSION_LEVEL, MAX_SITEMAP_SIZE};
