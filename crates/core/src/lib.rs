pub mod error;
pub mod helpers;
pub mod page;
pub mod sitemap;
pub mod web;

pub use error::SitemapError;
pub use page::{
    ChangeFrequency, SitemapNewsStory, SitemapPage, SITEMAP_PAGE_DEFAULT_PRIORITY,
};
pub use sitemap::{AllPages, Sitemap, SitemapKind};
pub use web::{
    is_retryable_status, ErrorResponse, SuccessResponse, WebClient, WebResponse,
    RETRYABLE_HTTP_STATUS_CODES,
};
