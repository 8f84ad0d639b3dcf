//! Streaming XML sitemap parsing.
//!
//! A namespace-normalizing dispatcher drives one of four concrete parser
//! state machines, chosen by the document's root element. Truncated or
//! malformed documents are salvaged: whatever the concrete parser
//! collected before the error is still turned into a result.

mod atom;
mod index;
mod rss;
mod urlset;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{LocalName, Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use tracing::error;

use sitemapper_core::{Sitemap, SitemapError};

pub(crate) use atom::AtomParser;
pub(crate) use index::IndexXmlParser;
pub(crate) use rss::RssParser;
pub(crate) use urlset::UrlsetParser;

/// What an XML document turned out to be.
pub(crate) enum XmlOutcome {
    /// A leaf sitemap, fully parsed.
    Pages(Sitemap),
    /// A `<sitemapindex>`; the caller recurses into these URLs.
    Index { sub_sitemap_urls: Vec<String> },
    /// Nothing we know how to parse.
    Unsupported { reason: String },
}

enum ConcreteParser {
    Urlset(UrlsetParser),
    Index(IndexXmlParser),
    Rss(RssParser),
    Atom(AtomParser),
}

impl ConcreteParser {
    fn element_start(
        &mut self,
        name: &str,
        attributes: &[(String, String)],
    ) -> Result<(), SitemapError> {
        match self {
            ConcreteParser::Urlset(parser) => parser.element_start(name),
            ConcreteParser::Index(_) => Ok(()),
            ConcreteParser::Rss(parser) => parser.element_start(name),
            ConcreteParser::Atom(parser) => parser.element_start(name, attributes),
        }
    }

    fn element_end(&mut self, name: &str, char_data: &str) -> Result<(), SitemapError> {
        match self {
            ConcreteParser::Urlset(parser) => parser.element_end(name, char_data),
            ConcreteParser::Index(parser) => {
                parser.element_end(name, char_data);
                Ok(())
            }
            ConcreteParser::Rss(parser) => parser.element_end(name, char_data),
            ConcreteParser::Atom(parser) => parser.element_end(name, char_data),
        }
    }

    fn finalize(self, url: &str) -> Result<XmlOutcome, SitemapError> {
        match self {
            ConcreteParser::Urlset(parser) => parser.finalize(url),
            ConcreteParser::Index(parser) => Ok(XmlOutcome::Index {
                sub_sitemap_urls: parser.finalize(),
            }),
            ConcreteParser::Rss(parser) => parser.finalize(url),
            ConcreteParser::Atom(parser) => parser.finalize(url),
        }
    }
}

/// Parse an XML sitemap of any supported flavor.
///
/// Some sitemap bodies end abruptly because web servers time out while
/// generating them; rather than discarding everything, parsing stops at
/// the first error and the state collected so far is finalized.
pub(crate) fn parse(url: &str, content: &str) -> Result<XmlOutcome, SitemapError> {
    let mut reader = NsReader::from_str(content);
    // Self-closing elements (e.g. Atom's <link .../>) must go through the
    // same start/end handling as paired tags
    reader.config_mut().expand_empty_elements = true;

    let mut concrete: Option<ConcreteParser> = None;

    // Character data can arrive in multiple runs for what is essentially a
    // single string (CDATA boundaries); contiguous runs are appended, and
    // the end of any element resets the accumulator.
    let mut char_data = String::new();
    let mut last_event_was_char_data = false;

    loop {
        match reader.read_resolved_event() {
            Ok((resolve, Event::Start(start))) => {
                last_event_was_char_data = false;
                let name = normalize_element_name(resolve, start.local_name());
                match concrete.as_mut() {
                    Some(parser) => {
                        let attributes = collect_attributes(&start);
                        if let Err(err) = parser.element_start(&name, &attributes) {
                            error!(url = %url, error = %err, "parsing sitemap failed");
                            break;
                        }
                    }
                    // Root element decides the concrete parser
                    None => match name.as_str() {
                        "sitemap:urlset" => {
                            concrete = Some(ConcreteParser::Urlset(UrlsetParser::new()));
                        }
                        "sitemap:sitemapindex" => {
                            concrete = Some(ConcreteParser::Index(IndexXmlParser::new()));
                        }
                        "rss" => {
                            concrete = Some(ConcreteParser::Rss(RssParser::new()));
                        }
                        "feed" => {
                            concrete = Some(ConcreteParser::Atom(AtomParser::new()));
                        }
                        _ => {
                            error!(url = %url, element = %name, "unsupported root element");
                            break;
                        }
                    },
                }
            }
            Ok((resolve, Event::End(end))) => {
                let name = normalize_element_name(resolve, end.local_name());
                let result = match concrete.as_mut() {
                    Some(parser) => parser.element_end(&name, &char_data),
                    None => Ok(()),
                };
                char_data.clear();
                last_event_was_char_data = false;
                if let Err(err) = result {
                    error!(url = %url, error = %err, "parsing sitemap failed");
                    break;
                }
            }
            Ok((_, Event::Text(text))) => {
                if concrete.is_some() {
                    match text.unescape() {
                        Ok(data) => {
                            append_char_data(
                                &mut char_data,
                                &mut last_event_was_char_data,
                                &data,
                            );
                        }
                        Err(err) => {
                            error!(url = %url, error = %err, "parsing sitemap failed");
                            break;
                        }
                    }
                }
            }
            Ok((_, Event::CData(cdata))) => {
                if concrete.is_some() {
                    let data = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                    append_char_data(&mut char_data, &mut last_event_was_char_data, &data);
                }
            }
            Ok((_, Event::Eof)) => break,
            // Declarations, comments, processing instructions, doctypes
            Ok(_) => {}
            Err(err) => {
                error!(url = %url, error = %err, "parsing sitemap failed");
                break;
            }
        }
    }

    match concrete {
        Some(parser) => parser.finalize(url),
        None => Ok(XmlOutcome::Unsupported {
            reason: format!("no parsers support sitemap from {url}"),
        }),
    }
}

fn append_char_data(buffer: &mut String, last_was_char_data: &mut bool, data: &str) {
    if !*last_was_char_data {
        buffer.clear();
    }
    buffer.push_str(data);
    *last_was_char_data = true;
}

/// Map the resolved namespace onto an internal prefix so the concrete
/// parsers can match on plain strings:
///
/// * the sitemap 0.9 namespace becomes `sitemap:`, e.g. `sitemap:loc`;
/// * the Google News namespace becomes `news:`, e.g. `news:publication_date`;
/// * anything else keeps the bare local name.
fn normalize_element_name(resolve: ResolveResult<'_>, local: LocalName<'_>) -> String {
    let local = String::from_utf8_lossy(local.into_inner());
    match resolve {
        ResolveResult::Bound(Namespace(namespace)) => {
            let namespace = String::from_utf8_lossy(namespace);
            if namespace.contains("/sitemap/") {
                format!("sitemap:{local}")
            } else if namespace.contains("/sitemap-news/") {
                format!("news:{local}")
            } else {
                local.into_owned()
            }
        }
        _ => local.into_owned(),
    }
}

fn collect_attributes(start: &BytesStart<'_>) -> Vec<(String, String)> {
    start
        .attributes()
        .filter_map(Result::ok)
        .filter_map(|attribute| {
            let key =
                String::from_utf8_lossy(attribute.key.local_name().into_inner()).into_owned();
            let value = attribute.unescape_value().ok()?.into_owned();
            Some((key, value))
        })
        .collect()
}

pub(crate) fn attribute<'a>(attributes: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Unescape entities and trim; empty results become `None`.
pub(crate) fn unescape_strip(value: &str) -> Option<String> {
    let unescaped = quick_xml::escape::unescape(value)
        .map(|unescaped| unescaped.into_owned())
        .unwrap_or_else(|_| value.to_string());
    let trimmed = unescaped.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub(crate) fn require_char_data(name: &str, char_data: &str) -> Result<(), SitemapError> {
    if char_data.is_empty() {
        return Err(SitemapError::XmlParse(format!(
            "character data is expected to be set at the end of <{name}>"
        )));
    }
    Ok(())
}
