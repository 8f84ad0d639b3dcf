use thiserror::Error;

#[derive(Error, Debug)]
pub enum SitemapError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("gunzip failed: {0}")]
    Gunzip(String),

    #[error("unable to strip URL to homepage: {0}")]
    StripHomepage(String),

    #[error("XML parsing failed: {0}")]
    XmlParse(String),
}
