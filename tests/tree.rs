//! End-to-end sitemap tree tests against a canned web client.

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;

use sitemapper::{
    sitemap_tree_for_homepage, ErrorResponse, Sitemap, SitemapError, SitemapKind,
    SuccessResponse, WebClient, WebResponse,
};

const HOMEPAGE: &str = "http://ex.com/";

struct CannedResponse {
    body: Vec<u8>,
    content_type: Option<&'static str>,
}

/// Web client serving canned bodies; every other URL gets a
/// non-retryable 404.
struct MockWebClient {
    responses: HashMap<String, CannedResponse>,
    fetched: Mutex<Vec<String>>,
    max_response_data_length: AtomicUsize,
}

impl MockWebClient {
    fn new() -> Self {
        Self {
            responses: HashMap::new(),
            fetched: Mutex::new(Vec::new()),
            max_response_data_length: AtomicUsize::new(0),
        }
    }

    fn serve(mut self, url: &str, body: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            CannedResponse {
                body: body.as_bytes().to_vec(),
                content_type: None,
            },
        );
        self
    }

    fn serve_gzipped(mut self, url: &str, body: &str) -> Self {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(body.as_bytes()).unwrap();
        self.responses.insert(
            url.to_string(),
            CannedResponse {
                body: encoder.finish().unwrap(),
                content_type: Some("application/gzip"),
            },
        );
        self
    }

    fn fetch_count(&self, url: &str) -> usize {
        self.fetched
            .lock()
            .unwrap()
            .iter()
            .filter(|fetched| fetched.as_str() == url)
            .count()
    }
}

#[async_trait]
impl WebClient for MockWebClient {
    fn set_max_response_data_length(&self, max_response_data_length: usize) {
        self.max_response_data_length
            .store(max_response_data_length, Ordering::Relaxed);
    }

    async fn get(&self, url: &str) -> WebResponse {
        self.fetched.lock().unwrap().push(url.to_string());
        match self.responses.get(url) {
            Some(canned) => {
                let mut headers = HashMap::new();
                if let Some(content_type) = canned.content_type {
                    headers.insert("Content-Type".to_string(), content_type.to_string());
                }
                let mut body = canned.body.clone();
                let max_length = self.max_response_data_length.load(Ordering::Relaxed);
                if max_length > 0 && body.len() > max_length {
                    body.truncate(max_length);
                }
                WebResponse::Success(SuccessResponse::new(200, "OK", headers, body))
            }
            None => WebResponse::Error(ErrorResponse::new("404 Not Found", false)),
        }
    }
}

fn urlset(urls: &[&str]) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
"#,
    );
    for url in urls {
        out.push_str(&format!("    <url><loc>{url}</loc></url>\n"));
    }
    out.push_str("</urlset>\n");
    out
}

fn page_urls(tree: &Sitemap) -> Vec<String> {
    tree.all_pages().map(|page| page.url.clone()).collect()
}

#[tokio::test]
async fn robots_txt_listing_one_xml_sitemap_of_two_pages() {
    let client = MockWebClient::new()
        .serve(
            "http://ex.com/robots.txt",
            "User-agent: *\nSitemap: http://ex.com/sm.xml\n",
        )
        .serve(
            "http://ex.com/sm.xml",
            &urlset(&["http://ex.com/a", "http://ex.com/b"]),
        );

    let tree = sitemap_tree_for_homepage(HOMEPAGE, Some(&client)).await.unwrap();

    assert_eq!(tree.url, HOMEPAGE);
    assert!(matches!(tree.kind, SitemapKind::IndexWebsite { .. }));

    let children = tree.sub_sitemaps().unwrap();
    let robots = &children[0];
    assert_eq!(robots.url, "http://ex.com/robots.txt");
    assert!(matches!(robots.kind, SitemapKind::IndexRobotsTxt { .. }));

    let robots_children = robots.sub_sitemaps().unwrap();
    assert_eq!(robots_children.len(), 1);
    assert_eq!(robots_children[0].url, "http://ex.com/sm.xml");
    assert!(matches!(
        robots_children[0].kind,
        SitemapKind::PagesXml { .. }
    ));

    assert_eq!(page_urls(&tree), vec!["http://ex.com/a", "http://ex.com/b"]);
}

#[tokio::test]
async fn gzipped_sitemap_found_at_unpublished_path() {
    // robots.txt is missing; the gzipped probe still finds the pages
    let client = MockWebClient::new()
        .serve_gzipped("http://ex.com/sitemap.xml.gz", &urlset(&["http://ex.com/z"]));

    let tree = sitemap_tree_for_homepage(HOMEPAGE, Some(&client)).await.unwrap();

    let children = tree.sub_sitemaps().unwrap();
    assert_eq!(children.len(), 2);

    // robots.txt entry is kept even though it failed
    assert!(children[0].is_invalid());
    assert_eq!(children[0].url, "http://ex.com/robots.txt");

    assert_eq!(children[1].url, "http://ex.com/sitemap.xml.gz");
    assert!(matches!(children[1].kind, SitemapKind::PagesXml { .. }));
    assert_eq!(page_urls(&tree), vec!["http://ex.com/z"]);
}

#[tokio::test]
async fn urls_advertised_by_robots_txt_are_not_probed_again() {
    let client = MockWebClient::new()
        .serve(
            "http://ex.com/robots.txt",
            "Sitemap: http://ex.com/sitemap.xml\n",
        )
        .serve("http://ex.com/sitemap.xml", &urlset(&["http://ex.com/a"]));

    let tree = sitemap_tree_for_homepage(HOMEPAGE, Some(&client)).await.unwrap();

    // One fetch through robots.txt; the unpublished-path probe skipped it
    assert_eq!(client.fetch_count("http://ex.com/sitemap.xml"), 1);

    // Only robots.txt made it into the root; no duplicate child
    let children = tree.sub_sitemaps().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(page_urls(&tree), vec!["http://ex.com/a"]);
}

#[tokio::test]
async fn homepage_url_is_stripped_before_probing() {
    let client = MockWebClient::new()
        .serve("http://ex.com/robots.txt", "Sitemap: http://ex.com/sm.xml\n")
        .serve("http://ex.com/sm.xml", &urlset(&["http://ex.com/a"]));

    let tree =
        sitemap_tree_for_homepage("http://ex.com/deep/page.html?q=1", Some(&client))
            .await
            .unwrap();

    assert_eq!(tree.url, HOMEPAGE);
    assert_eq!(page_urls(&tree), vec!["http://ex.com/a"]);
}

#[tokio::test]
async fn invalid_homepage_urls_are_rejected() {
    let client = MockWebClient::new();

    for bad in ["", "not an URL", "ftp://ex.com/", "http:/ex.com/"] {
        let result = sitemap_tree_for_homepage(bad, Some(&client)).await;
        assert!(
            matches!(result, Err(SitemapError::InvalidInput(_))),
            "expected InvalidInput for {bad:?}",
        );
    }

    // Nothing was fetched for any of them
    assert!(client.fetched.lock().unwrap().is_empty());
}

#[tokio::test]
async fn sitemap_index_chain_is_followed_through_robots_txt() {
    let client = MockWebClient::new()
        .serve(
            "http://ex.com/robots.txt",
            "Sitemap: http://ex.com/sitemap_index.xml\n",
        )
        .serve(
            "http://ex.com/sitemap_index.xml",
            r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
    <sitemap><loc>http://ex.com/pages.xml</loc></sitemap>
    <sitemap><loc>http://ex.com/missing.xml</loc></sitemap>
</sitemapindex>"#,
        )
        .serve(
            "http://ex.com/pages.xml",
            &urlset(&["http://ex.com/1", "http://ex.com/2"]),
        );

    let tree = sitemap_tree_for_homepage(HOMEPAGE, Some(&client)).await.unwrap();

    let robots = &tree.sub_sitemaps().unwrap()[0];
    let index = &robots.sub_sitemaps().unwrap()[0];
    assert!(matches!(index.kind, SitemapKind::IndexXml { .. }));

    let index_children = index.sub_sitemaps().unwrap();
    assert_eq!(index_children.len(), 2);
    assert!(!index_children[0].is_invalid());
    assert!(index_children[1].is_invalid());

    assert_eq!(page_urls(&tree), vec!["http://ex.com/1", "http://ex.com/2"]);
}

#[tokio::test]
async fn recursion_loop_between_two_indexes_terminates() {
    let index_a = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
    <sitemap><loc>http://ex.com/b.xml</loc></sitemap>
</sitemapindex>"#;
    let index_b = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
    <sitemap><loc>http://ex.com/a.xml</loc></sitemap>
</sitemapindex>"#;

    let client = MockWebClient::new()
        .serve("http://ex.com/robots.txt", "Sitemap: http://ex.com/a.xml\n")
        .serve("http://ex.com/a.xml", index_a)
        .serve("http://ex.com/b.xml", index_b);

    let tree = sitemap_tree_for_homepage(HOMEPAGE, Some(&client)).await.unwrap();

    // The chain bottoms out in an Invalid leaf complaining about recursion
    let mut current = &tree.sub_sitemaps().unwrap()[0];
    while let Some(children) = current.sub_sitemaps() {
        assert_eq!(children.len(), 1);
        current = &children[0];
    }
    assert!(current.is_invalid());
    assert!(current.reason().unwrap().contains("recursion level"));

    // No endless fetching: robots.txt, then 11 index fetches (levels 0
    // through 10), then the 14 unpublished-path probes
    let total = client.fetched.lock().unwrap().len();
    assert_eq!(total, 1 + 11 + 14);
}

#[tokio::test]
async fn robots_txt_serving_html_is_invalid_but_contained() {
    let client = MockWebClient::new()
        .serve("http://ex.com/robots.txt", "<html><body>oops</body></html>")
        .serve("http://ex.com/sitemap.xml", &urlset(&["http://ex.com/a"]));

    let tree = sitemap_tree_for_homepage(HOMEPAGE, Some(&client)).await.unwrap();

    let children = tree.sub_sitemaps().unwrap();
    // robots.txt sniffed as XML, found unsupported, kept as Invalid
    assert!(children[0].is_invalid());
    // ...while the probed sitemap still contributes its page
    assert_eq!(page_urls(&tree), vec!["http://ex.com/a"]);
}

#[tokio::test]
async fn plain_text_sitemap_probed_from_unpublished_path() {
    let client = MockWebClient::new().serve(
        "http://ex.com/sitemap",
        "http://ex.com/one\nhttp://ex.com/two\nhttp://ex.com/one\n",
    );

    let tree = sitemap_tree_for_homepage(HOMEPAGE, Some(&client)).await.unwrap();

    let children = tree.sub_sitemaps().unwrap();
    assert_eq!(children.len(), 2);
    assert!(children[0].is_invalid()); // robots.txt
    assert!(matches!(children[1].kind, SitemapKind::PagesText { .. }));
    assert_eq!(page_urls(&tree), vec!["http://ex.com/one", "http://ex.com/two"]);
}

#[tokio::test]
async fn news_sitemap_pages_carry_their_stories() {
    let news_sitemap = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
        xmlns:news="http://www.google.com/schemas/sitemap-news/0.9">
    <url>
        <loc>http://ex.com/news/story.html</loc>
        <news:news>
            <news:publication>
                <news:name>Example Times</news:name>
                <news:language>en</news:language>
            </news:publication>
            <news:publication_date>2017-12-01T10:00:00Z</news:publication_date>
            <news:title>Story of the day</news:title>
        </news:news>
    </url>
</urlset>"#;

    let client = MockWebClient::new()
        .serve("http://ex.com/robots.txt", "Sitemap: http://ex.com/news.xml\n")
        .serve("http://ex.com/news.xml", news_sitemap);

    let tree = sitemap_tree_for_homepage(HOMEPAGE, Some(&client)).await.unwrap();

    let pages: Vec<_> = tree.all_pages().collect();
    assert_eq!(pages.len(), 1);
    let story = pages[0].news_story.as_ref().unwrap();
    assert_eq!(story.title, "Story of the day");
    assert_eq!(story.publication_name.as_deref(), Some("Example Times"));
    assert_eq!(story.publication_language.as_deref(), Some("en"));
}
