//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock HTTP servers and run Site and
//! Gather jobs end-to-end through the job manager and the HTTP fetcher.

use std::time::Duration;
use sumi_trawl::config::Config;
use sumi_trawl::crawler::{Fetcher, HttpFetcher, JobStats};
use sumi_trawl::job::{JobEvent, JobManager, JobRequest};
use sumi_trawl::{ExtractedRecord, FetchError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a configuration with short timeouts and backoff for testing
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.request_timeout_ms = 2000;
    config.crawler.retry_backoff_ms = 10;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}

/// An HTML response; wiremock's string bodies are always served as text/plain
fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, page: &str, body: String, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .expect(expected_hits)
        .mount(server)
        .await;
}

async fn run_to_end(
    manager: &JobManager,
    request: JobRequest,
) -> (Vec<ExtractedRecord>, JobStats) {
    let handle = manager.start_job(request).expect("Failed to start job");
    let (records, terminal) = handle.events.collect().await;
    match terminal {
        Some(JobEvent::Complete(stats)) => (records, stats),
        other => panic!("expected Complete, got {:?}", other),
    }
}

#[tokio::test]
async fn test_site_crawl_visits_each_page_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        format!(
            r#"<html><head><title>Home</title></head><body>
            <h1>Welcome</h1><p>Start here</p>
            <a href="{base}/page1">Page 1</a>
            <a href="/page2">Page 2</a>
            <a href="/page1/#section">Page 1 again</a>
            <a href="mailto:someone@example.com">Mail</a>
            </body></html>"#
        ),
        1,
    )
    .await;
    mount_page(
        &server,
        "/page1",
        r#"<html><head><title>Page 1</title></head><body><p>One</p><a href="/">Home</a></body></html>"#
            .to_string(),
        1,
    )
    .await;
    mount_page(
        &server,
        "/page2",
        r#"<html><head><title>Page 2</title></head><body><p>Two</p><a href="/page1">1</a></body></html>"#
            .to_string(),
        1,
    )
    .await;

    let manager = JobManager::new(create_test_config()).expect("Failed to create manager");
    let (records, stats) = run_to_end(
        &manager,
        JobRequest::site(format!("{}/", base)).with_selectors("text,headings"),
    )
    .await;

    assert_eq!(records.len(), 3);
    assert_eq!(stats.requests, 3);
    assert_eq!(stats.urls_discovered, 3);

    let mut urls: Vec<_> = records.iter().map(|r| r.url.clone()).collect();
    urls.sort();
    urls.dedup();
    assert_eq!(urls.len(), 3);

    let home = records
        .iter()
        .find(|r| r.title == "Home")
        .expect("home page record");
    assert_eq!(home.headings, Some(vec!["Welcome".to_string()]));
    assert_eq!(home.text, Some(vec!["Start here".to_string()]));
    assert!(home.links.is_none());
    assert!(home.images.is_none());
}

#[tokio::test]
async fn test_site_limit_caps_requests_and_records() {
    let server = MockServer::start().await;

    let links: String = (1..=5)
        .map(|i| format!(r#"<a href="/p{i}">p{i}</a>"#))
        .collect();
    Mock::given(method("GET"))
        .respond_with(html(format!("<html><body><p>page</p>{links}</body></html>")))
        .mount(&server)
        .await;

    let manager = JobManager::new(create_test_config()).expect("Failed to create manager");
    let (records, stats) = run_to_end(
        &manager,
        JobRequest::site(server.uri()).with_limit(2),
    )
    .await;

    assert_eq!(records.len(), 2);
    assert_eq!(stats.requests, 2);
    assert_eq!(stats.records_emitted, 2);

    let received = server.received_requests().await.expect("recording enabled");
    assert_eq!(received.len(), 2);
}

#[tokio::test]
async fn test_gather_unwraps_redirects_and_filters() {
    let provider = MockServer::start().await;
    let content = MockServer::start().await;

    let article = format!("{}/article", content.uri());
    let encoded: String = url::form_urlencoded::byte_serialize(article.as_bytes()).collect();
    let results = format!(
        r#"<html><body>
        <div class="result"><a class="result__a" href="/l/?uddg={encoded}&rut=abc">Article</a></div>
        <div class="result"><a class="result__a" href="/l/?rut=missing">Broken</a></div>
        <div class="result"><a class="result__a" href="{}/recipe">Recipe</a></div>
        <div class="result"><a class="result__a" href="{}/html/?q=more">More results</a></div>
        </body></html>"#,
        content.uri(),
        provider.uri()
    );

    Mock::given(method("GET"))
        .and(path("/html/"))
        .and(query_param("q", "rust tokio"))
        .respond_with(html(results))
        .expect(2)
        .mount(&provider)
        .await;

    mount_page(
        &content,
        "/article",
        r#"<html><head><title>Async Rust</title></head><body>
        <p>Tokio is an asynchronous runtime for the Rust language.</p>
        <p>short</p>
        </body></html>"#
            .to_string(),
        1,
    )
    .await;
    mount_page(
        &content,
        "/recipe",
        r#"<html><head><title>Soup</title></head><body><p>A warm bowl of soup for cold evenings.</p></body></html>"#
            .to_string(),
        1,
    )
    .await;

    let mut config = create_test_config();
    config.search.base_url = format!("{}/html/", provider.uri());

    let manager = JobManager::new(config).expect("Failed to create manager");
    let (records, stats) = run_to_end(
        &manager,
        JobRequest::gather("rust")
            .with_keywords("tokio")
            .with_selectors("text")
            .with_limit(10),
    )
    .await;

    // Two planned result pages plus the two distinct content pages
    assert_eq!(stats.requests, 4);
    assert_eq!(stats.rejected_by_filter, 1);

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.url, article);
    assert_eq!(record.title, "Async Rust");
    assert_eq!(
        record.text,
        Some(vec![
            "Tokio is an asynchronous runtime for the Rust language.".to_string()
        ])
    );

    let json = serde_json::to_value(record).unwrap();
    assert_eq!(json["type"], "gathered");
}

#[tokio::test]
async fn test_fetch_retries_transient_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/flaky",
        "<html><body><p>Recovered</p></body></html>".to_string(),
        1,
    )
    .await;

    let fetcher = HttpFetcher::new(&create_test_config()).expect("Failed to build fetcher");
    let url = format!("{}/flaky", server.uri());
    let page = fetcher.fetch(&url).await.expect("retry should succeed");
    assert!(page.body.contains("Recovered"));
    assert_eq!(page.url, url);
}

#[tokio::test]
async fn test_fetch_does_not_retry_client_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config();
    config.crawler.max_attempts = 3;
    let fetcher = HttpFetcher::new(&config).expect("Failed to build fetcher");

    let err = fetcher
        .fetch(&format!("{}/missing", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_fetch_rejects_non_html() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&create_test_config()).expect("Failed to build fetcher");
    let err = fetcher
        .fetch(&format!("{}/data.json", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::ContentMismatch { .. }));
}

#[tokio::test]
async fn test_failed_pages_do_not_stop_the_job() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<html><body><p>Root</p>
        <a href="/data.json">data</a><a href="/gone">gone</a><a href="/ok">ok</a>
        </body></html>"#
            .to_string(),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;
    mount_page(&server, "/ok", "<html><body><p>Fine</p></body></html>".to_string(), 1).await;

    let manager = JobManager::new(create_test_config()).expect("Failed to create manager");
    let (records, stats) = run_to_end(&manager, JobRequest::site(server.uri())).await;

    assert_eq!(records.len(), 2);
    assert_eq!(stats.requests, 4);
    assert_eq!(stats.fetch_failures, 2);
}

#[tokio::test]
async fn test_stop_job_delivers_complete() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            html("<html><body><p>slow</p><a href='/next'>next</a></body></html>")
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let manager = JobManager::new(create_test_config()).expect("Failed to create manager");
    let mut handle = manager
        .start_job(JobRequest::site(server.uri()).with_limit(50))
        .expect("Failed to start job");

    manager.stop_job(handle.id);

    let mut terminal = None;
    while let Some(event) = handle.events.recv().await {
        match event {
            JobEvent::Record(record) => panic!("record after stop: {}", record.url),
            other => terminal = Some(other),
        }
    }
    assert!(matches!(terminal, Some(JobEvent::Complete(_))));

    for _ in 0..100 {
        if manager.active_jobs() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(manager.active_jobs(), 0);
    assert_eq!(manager.status(handle.id), None);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected() {
    let manager = JobManager::new(create_test_config()).expect("Failed to create manager");

    assert!(manager.start_job(JobRequest::site("")).is_err());
    assert!(manager.start_job(JobRequest::site("ftp://example.com/")).is_err());
    assert!(manager.start_job(JobRequest::gather("   ")).is_err());
    assert_eq!(manager.active_jobs(), 0);
}

#[tokio::test]
async fn test_redirect_into_directory_resolves_against_landing_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/docs/"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/docs/",
        r#"<html><body><p>Docs</p><a href="intro.html">Intro</a></body></html>"#.to_string(),
        1,
    )
    .await;
    mount_page(
        &server,
        "/docs/intro.html",
        "<html><body><p>Intro</p></body></html>".to_string(),
        1,
    )
    .await;

    let manager = JobManager::new(create_test_config()).expect("Failed to create manager");
    let (records, stats) = run_to_end(
        &manager,
        JobRequest::site(format!("{}/moved", server.uri())),
    )
    .await;

    assert_eq!(records.len(), 2);
    assert_eq!(stats.fetch_failures, 0);
    assert!(records
        .iter()
        .any(|r| r.url == format!("{}/docs/", server.uri())));
}

#[tokio::test]
async fn test_gather_limit_with_concurrent_workers() {
    let provider = MockServer::start().await;
    let content = MockServer::start().await;

    let results: String = (1..=6)
        .map(|i| format!(r#"<a class="result__a" href="{}/r{i}">r{i}</a>"#, content.uri()))
        .collect();
    Mock::given(method("GET"))
        .and(path("/html/"))
        .respond_with(html(format!("<html><body>{results}</body></html>")))
        .mount(&provider)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            html("<html><head><title>Rust</title></head><body><p>Rust all the way down.</p></body></html>")
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&content)
        .await;

    let mut config = create_test_config();
    config.crawler.max_concurrent_fetches = 3;
    config.search.base_url = format!("{}/html/", provider.uri());

    let manager = JobManager::new(config).expect("Failed to create manager");
    let (records, stats) = run_to_end(&manager, JobRequest::gather("rust").with_limit(2)).await;

    assert_eq!(records.len(), 2);
    assert_eq!(stats.records_emitted, 2);
    // Budget is ten requests; the job stops well short of it
    assert!(stats.requests < 10, "{} requests", stats.requests);

    let fetched = content.received_requests().await.expect("recording enabled");
    assert!(fetched.len() < 6, "{} content fetches", fetched.len());
}
