//! Sitemap fetching and parsing: retry-wrapped fetch, gzip/UTF-8
//! decoding, format sniffing, and the robots.txt / plain-text / XML
//! parsers behind it.

mod encoding;
mod fetch;
mod retry;
mod robots;
mod text;
mod xml;

pub use fetch::{fetch_sitemap, MAX_RECURSION_LEVEL, MAX_SITEMAP_SIZE};
pub use retry::get_with_retry;
