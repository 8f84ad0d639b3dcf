use std::collections::HashSet;

use tracing::{debug, warn};

use sitemapper_client::HttpWebClient;
use sitemapper_core::helpers::{is_http_url, strip_url_to_homepage};
use sitemapper_core::{Sitemap, SitemapError, SitemapKind, WebClient};
use sitemapper_parser::fetch_sitemap;

/// Paths which are not exposed in robots.txt but might still serve a
/// sitemap.
const UNPUBLISHED_SITEMAP_PATHS: [&str; 14] = [
    "sitemap.xml",
    "sitemap.xml.gz",
    "sitemap_index.xml",
    "sitemap-index.xml",
    "sitemap_index.xml.gz",
    "sitemap-index.xml.gz",
    ".sitemap.xml",
    "sitemap",
    "admin/config/search/xmlsitemap",
    "sitemap/sitemap-index.xml",
    "sitemap_news.xml",
    "sitemap-news.xml",
    "sitemap_news.xml.gz",
    "sitemap-news.xml.gz",
];

/// Using a homepage URL, fetch the tree of sitemaps and pages listed in
/// them.
///
/// Sitemaps are discovered via `Sitemap:` lines in robots.txt plus a
/// fixed list of well-known paths. The result is always an
/// `IndexWebsite` sitemap whose children are whatever was found; fetch
/// and parse failures along the way are contained in the tree as
/// `Invalid` entries. Only an unusable homepage URL makes this return an
/// error.
///
/// When no web client is given, [`HttpWebClient`] is used.
pub async fn sitemap_tree_for_homepage(
    homepage_url: &str,
    web_client: Option<&dyn WebClient>,
) -> Result<Sitemap, SitemapError> {
    if !is_http_url(homepage_url) {
        return Err(SitemapError::InvalidInput(format!(
            "URL {homepage_url} is not a HTTP(s) URL"
        )));
    }

    let stripped_homepage_url = strip_url_to_homepage(homepage_url)?;
    if homepage_url != stripped_homepage_url {
        warn!(
            homepage = %homepage_url,
            stripped = %stripped_homepage_url,
            "assuming the stripped URL is the homepage",
        );
    }

    let default_client;
    let web_client: &dyn WebClient = match web_client {
        Some(client) => client,
        None => {
            default_client = HttpWebClient::new();
            &default_client
        }
    };

    let robots_txt_url = format!("{stripped_homepage_url}robots.txt");
    let robots_txt_sitemap = match fetch_sitemap(&robots_txt_url, 0, web_client).await {
        Ok(sitemap) => sitemap,
        Err(err) => Sitemap::invalid(
            &robots_txt_url,
            format!("unable to fetch sitemap from {robots_txt_url}: {err}"),
        ),
    };

    let mut urls_found_in_robots_txt: HashSet<String> = HashSet::new();
    if let SitemapKind::IndexRobotsTxt { sub_sitemaps } = &robots_txt_sitemap.kind {
        for sub_sitemap in sub_sitemaps {
            urls_found_in_robots_txt.insert(sub_sitemap.url.clone());
        }
    }

    // The robots.txt result is kept even when it is invalid
    let mut sitemaps = vec![robots_txt_sitemap];

    for unpublished_sitemap_path in UNPUBLISHED_SITEMAP_PATHS {
        let unpublished_sitemap_url =
            format!("{stripped_homepage_url}{unpublished_sitemap_path}");

        // Don't refetch URLs already referenced by robots.txt
        if urls_found_in_robots_txt.contains(&unpublished_sitemap_url) {
            continue;
        }

        match fetch_sitemap(&unpublished_sitemap_url, 0, web_client).await {
            // Skip the ones that weren't found
            Ok(sitemap) if !sitemap.is_invalid() => sitemaps.push(sitemap),
            Ok(_) => {}
            Err(err) => {
                debug!(
                    url = %unpublished_sitemap_url,
                    error = %err,
                    "skipping unpublished sitemap path",
                );
            }
        }
    }

    Ok(Sitemap::index_website(stripped_homepage_url, sitemaps))
}
