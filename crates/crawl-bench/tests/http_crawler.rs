//! HTTP crawler against a local mock server
//!
//! Run with: cargo test -p crawl-bench --test http_crawler

use crawl_bench::crawler::{CrawlOptions, Crawler, HttpCrawler};
use crawl_bench::error::CrawlError;
use mockito::{Matcher, Server, ServerGuard};
use pretty_assertions::assert_eq;
use std::time::Duration;

fn options(max_pages: u32, max_depth: u32) -> CrawlOptions {
    CrawlOptions {
        max_pages,
        max_depth,
        timeout: Duration::from_secs(5),
        max_concurrency: None,
    }
}

fn html(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!("<a href=\"{}\">link</a>", href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, anchors
    )
}

async fn page(server: &mut ServerGuard, path: &str, body: String) -> mockito::Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(body)
        .create_async()
        .await
}

#[tokio::test]
async fn test_crawl_follows_same_host_links_to_depth() {
    let mut server = Server::new_async().await;
    page(
        &mut server,
        "/",
        html("Home", &["/a", "/b#section", "/a", "https://other.invalid/x", "mailto:x@y.z"]),
    )
    .await;
    page(&mut server, "/a", html("A", &["/c"])).await;
    page(&mut server, "/b", html("B", &[])).await;
    let deep = server
        .mock("GET", "/c")
        .with_status(200)
        .expect(0)
        .create_async()
        .await;

    let crawler = HttpCrawler::new(4).unwrap();
    let data = crawler.crawl(&server.url(), &options(10, 1)).await.unwrap();

    let mut titles: Vec<_> = data.items.iter().map(|p| p.title.as_str()).collect();
    titles.sort();
    assert_eq!(titles, vec!["A", "B", "Home"]);
    assert_eq!(data.metadata.total_pages, 3);
    assert_eq!(data.metadata.original_url, server.url());

    let home = data.items.iter().find(|p| p.title == "Home").unwrap();
    assert_eq!(home.metadata.depth, 0);
    assert_eq!(home.metadata.status_code, Some(200));
    assert_eq!(home.metadata.content_length, home.html_content.len());
    assert!(data
        .items
        .iter()
        .filter(|p| p.title != "Home")
        .all(|p| p.metadata.depth == 1));

    deep.assert_async().await;
}

#[tokio::test]
async fn test_crawl_respects_page_budget() {
    let mut server = Server::new_async().await;
    let home = html("Home", &["/1", "/2", "/3", "/4"]);
    page(&mut server, "/", home).await;
    server
        .mock("GET", Matcher::Regex(r"^/\d$".to_string()))
        .with_status(200)
        .with_body(html("Child", &[]))
        .create_async()
        .await;

    let crawler = HttpCrawler::new(10).unwrap();
    let data = crawler.crawl(&server.url(), &options(2, 3)).await.unwrap();
    assert_eq!(data.items.len(), 2);
    assert_eq!(data.items[0].title, "Home");
}

#[tokio::test]
async fn test_broken_child_page_is_skipped() {
    let mut server = Server::new_async().await;
    let home = html("Home", &["/ok", "/missing"]);
    page(&mut server, "/", home).await;
    page(&mut server, "/ok", html("Ok", &[])).await;
    server
        .mock("GET", "/missing")
        .with_status(404)
        .create_async()
        .await;

    let crawler = HttpCrawler::new(2).unwrap();
    let data = crawler.crawl(&server.url(), &options(10, 2)).await.unwrap();
    let titles: Vec<_> = data.items.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Home", "Ok"]);
}

#[tokio::test]
async fn test_failing_seed_fails_the_crawl() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/")
        .with_status(503)
        .create_async()
        .await;

    let crawler = HttpCrawler::new(2).unwrap();
    let err = crawler
        .crawl(&server.url(), &options(5, 1))
        .await
        .unwrap_err();
    assert!(
        matches!(err, CrawlError::Status { status: 503, .. }),
        "got {:?}",
        err
    );
}

#[tokio::test]
async fn test_connection_refused_is_a_request_error() {
    let crawler = HttpCrawler::new(1).unwrap();
    let err = crawler
        .crawl("http://127.0.0.1:1/", &options(5, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, CrawlError::Request(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_invalid_seed_is_rejected() {
    let crawler = HttpCrawler::new(1).unwrap();
    let err = crawler
        .crawl("ftp://example.com", &options(5, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, CrawlError::InvalidUrl { .. }));
}

#[tokio::test]
async fn test_scrap_fetches_single_page() {
    let mut server = Server::new_async().await;
    let article = html("Article", &["/next"]);
    page(&mut server, "/article", article).await;
    let next = server.mock("GET", "/next").expect(0).create_async().await;

    let crawler = HttpCrawler::new(1).unwrap();
    let record = crawler
        .scrap(&format!("{}/article", server.url()), &options(1, 1))
        .await
        .unwrap();

    assert_eq!(record.title, "Article");
    assert!(record.url.ends_with("/article"));
    next.assert_async().await;
}
