//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end with the reqwest-backed client.

use sitemap_crawler::config::{Config, CrawlerConfig, UserAgentConfig};
use sitemap_crawler::output::export_to_path;
use sitemap_crawler::{crawl, normalize_url, CrawlError, TransportError};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with short timeouts
fn create_test_config() -> Config {
    Config {
        crawler: CrawlerConfig {
            request_timeout_secs: 5,
            crawl_timeout_secs: Some(30),
            channel_capacity: 1,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: Some("https://example.com/bot".to_string()),
        },
        ..Config::default()
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body).into_bytes(),
        "text/html",
    )
}

/// Mounts a page that must be requested exactly once
async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .expect(1)
        .mount(server)
        .await;
}

fn seed(server: &MockServer) -> Url {
    normalize_url(&format!("{}/", server.uri())).unwrap()
}

fn page(server: &MockServer, p: &str) -> String {
    format!("{}{}", server.uri(), p)
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        &format!(
            r#"<a href="/page1">Page 1</a>
               <a href="{}/page2">Page 2</a>
               <a href="http://external.test/">External</a>"#,
            base_url
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/page1",
        r#"<a href="/page2">Page 2 again</a><a href="/">Home</a>"#,
    )
    .await;
    mount_page(&mock_server, "/page2", "<p>No links here</p>").await;

    let seed = seed(&mock_server);
    let report = crawl(&seed, &create_test_config()).await.unwrap();
    let graph = &report.graph;

    assert_eq!(graph.root(), Some(seed.as_str()));
    assert_eq!(graph.node_count(), 3);
    assert!(graph.has_edge(seed.as_str(), &page(&mock_server, "/page1")));
    assert!(graph.has_edge(seed.as_str(), &page(&mock_server, "/page2")));
    assert!(graph.has_edge(&page(&mock_server, "/page1"), seed.as_str()));
    assert!(!graph.has_edge(&page(&mock_server, "/page1"), &page(&mock_server, "/page2")));
    assert!(!graph.contains("http://external.test/"));

    assert_eq!(report.stats.pages_fetched, 3);
    assert_eq!(report.stats.fetch_failures, 0);
    // Each page fetched once; verified when the server drops
}

#[tokio::test]
async fn test_seed_not_found_fails_crawl() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let result = crawl(&seed(&mock_server), &create_test_config()).await;

    match result {
        Err(CrawlError::SeedFetch { source, .. }) => {
            assert_eq!(source, TransportError::Status(404));
        }
        other => panic!("expected seed failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_seed_fails_crawl() {
    // Nothing listens on the discard port
    let seed = Url::parse("http://127.0.0.1:9/").unwrap();
    let result = crawl(&seed, &create_test_config()).await;

    assert!(matches!(
        result,
        Err(CrawlError::SeedFetch {
            source: TransportError::Request(_),
            ..
        })
    ));
}

#[tokio::test]
async fn test_broken_links_do_not_stop_crawl() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/missing">Gone</a><a href="/error">Broken</a><a href="/ok">Fine</a>"#,
    )
    .await;
    mount_page(&mock_server, "/ok", "").await;
    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    // "/missing" falls through to wiremock's default 404

    let report = crawl(&seed(&mock_server), &create_test_config())
        .await
        .unwrap();

    assert!(report.graph.contains(&page(&mock_server, "/missing")));
    assert!(report.graph.contains(&page(&mock_server, "/error")));
    assert!(report.graph.contains(&page(&mock_server, "/ok")));
    assert_eq!(report.stats.fetch_failures, 2);
}

#[tokio::test]
async fn test_cyclic_site_terminates_and_exports() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", r#"<a href="/a">A</a>"#).await;
    mount_page(&mock_server, "/a", r#"<a href="/b">B</a>"#).await;
    mount_page(&mock_server, "/b", r#"<a href="/a">A</a><a href="/">Home</a>"#).await;

    let seed = seed(&mock_server);
    let report = crawl(&seed, &create_test_config()).await.unwrap();

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("result.out");
    export_to_path(&report.graph, Some(&report.stats), &output).unwrap();

    let expected = format!(
        "{root}\n  {a}\n    {b}\n      {root}\n",
        root = seed,
        a = page(&mock_server, "/a"),
        b = page(&mock_server, "/b"),
    );
    assert_eq!(std::fs::read_to_string(&output).unwrap(), expected);
}

#[tokio::test]
async fn test_markdown_export() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", r#"<a href="/about">About</a>"#).await;
    mount_page(&mock_server, "/about", "").await;

    let report = crawl(&seed(&mock_server), &create_test_config())
        .await
        .unwrap();

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("site.md");
    export_to_path(&report.graph, Some(&report.stats), &output).unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.starts_with("# Site Map"));
    assert!(content.contains("| Pages fetched | 2 |"));
    assert!(content.contains(&format!("  - <{}>", page(&mock_server, "/about"))));
}

#[tokio::test]
async fn test_user_agent_header_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "TestBot/1.0.0 (+https://example.com/bot)"))
        .respond_with(html(""))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = crawl(&seed(&mock_server), &create_test_config())
        .await
        .unwrap();
    assert_eq!(report.graph.node_count(), 1);
}

#[tokio::test]
async fn test_subpath_seed_limits_scope() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/docs/",
        r#"<a href="/docs/intro">Intro</a><a href="/blog/">Blog</a>"#,
    )
    .await;
    mount_page(&mock_server, "/docs/intro", "").await;
    Mock::given(method("GET"))
        .and(path("/blog/"))
        .respond_with(html(""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let seed = normalize_url(&page(&mock_server, "/docs/")).unwrap();
    let graph = crawl(&seed, &create_test_config()).await.unwrap().graph;

    assert_eq!(graph.node_count(), 2);
    assert!(!graph.contains(&page(&mock_server, "/blog/")));
}

#[tokio::test]
async fn test_non_html_response_not_parsed() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/report.pdf">Report</a><a href="/about">About</a>"#,
    )
    .await;
    mount_page(&mock_server, "/about", "").await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(&b"%PDF-1.4 <a href=\"/hidden\">x</a>"[..], "application/pdf"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hidden"))
        .respond_with(html(""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let seed = seed(&mock_server);
    let report = crawl(&seed, &create_test_config()).await.unwrap();
    let graph = &report.graph;

    assert!(graph.has_edge(seed.as_str(), &page(&mock_server, "/report.pdf")));
    assert!(!graph.contains(&page(&mock_server, "/hidden")));
    assert_eq!(graph.node_count(), 3);
    assert_eq!(report.stats.fetch_failures, 0);
}
