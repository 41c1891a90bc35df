//! Integration tests for FeedFetcher using wiremock
//!
//! These tests validate the HTTP fetcher's behavior with mock servers.

mod common;

use std::sync::Arc;
use std::time::Duration;

use delivery_board::feed::{FeedFetcher, FeedSource};
use delivery_board::utils::error::FetchError;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, headers, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Test successful fetch from mock server
#[tokio::test]
async fn test_fetch_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pub"))
        .and(query_param("output", "csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(common::sample_feed()))
        .mount(&mock_server)
        .await;

    let fetcher = FeedFetcher::new(&format!("{}/pub?output=csv", mock_server.uri())).unwrap();
    let result = fetcher.fetch_text().await;

    assert!(result.is_ok(), "Fetch should succeed: {:?}", result.err());
    let body = result.unwrap();
    assert!(body.starts_with(common::HEADER));
    assert!(body.contains("Mill Lane"));
}

/// Every request carries a fresh cache-busting parameter and no-cache headers
#[tokio::test]
async fn test_cache_defeating_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feed.csv"))
        .and(headers("cache-control", vec!["no-cache", "no-store"]))
        .and(header("pragma", "no-cache"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Date"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let fetcher = FeedFetcher::new(&format!("{}/feed.csv", mock_server.uri())).unwrap();
    fetcher.fetch_text().await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    fetcher.fetch_text().await.unwrap();

    let requests: Vec<Request> = mock_server.received_requests().await.unwrap();
    let stamps: Vec<String> = requests
        .iter()
        .map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "nocache")
                .map(|(_, v)| v.into_owned())
                .expect("nocache parameter missing")
        })
        .collect();

    assert_eq!(stamps.len(), 2);
    assert_ne!(stamps[0], stamps[1]);
    assert!(stamps.iter().all(|s| s.parse::<i64>().is_ok()));
}

/// Non-success statuses surface as network errors with the status text
#[tokio::test]
async fn test_server_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feed.csv"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1) // no retry
        .mount(&mock_server)
        .await;

    let fetcher = FeedFetcher::new(&format!("{}/feed.csv", mock_server.uri())).unwrap();
    let err = fetcher.fetch_text().await.unwrap_err();

    assert!(matches!(err, FetchError::Status { code: 503, .. }));
    assert_eq!(err.to_string(), "Network error: 503 Service Unavailable");
}

/// Test 404 is reported without retry
#[tokio::test]
async fn test_404_no_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = FeedFetcher::new(&format!("{}/missing", mock_server.uri())).unwrap();
    let result = fetcher.fetch_text().await;

    assert!(matches!(result, Err(FetchError::Status { code: 404, .. })));
}

/// Redirects are followed
#[tokio::test]
async fn test_follows_redirect() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/new", mock_server.uri())),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Date,Customer"))
        .mount(&mock_server)
        .await;

    let fetcher = FeedFetcher::new(&format!("{}/old", mock_server.uri())).unwrap();
    assert_eq!(fetcher.fetch_text().await.unwrap(), "Date,Customer");
}

/// Test request timeout handling
#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("Date")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let fetcher = FeedFetcher::with_config(
        &format!("{}/slow", mock_server.uri()),
        Duration::from_millis(200),
        "delivery-board-test",
    )
    .unwrap();

    let result = fetcher.fetch_text().await;
    assert!(matches!(result, Err(FetchError::Timeout)));
}

/// Body that is not UTF-8 still decodes
#[tokio::test]
async fn test_latin1_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/latin1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"Customer\nCaf\xe9".to_vec()))
        .mount(&mock_server)
        .await;

    let fetcher = FeedFetcher::new(&format!("{}/latin1", mock_server.uri())).unwrap();
    assert_eq!(fetcher.fetch_text().await.unwrap(), "Customer\nCaf\u{e9}");
}

/// Cancelling the token aborts a slow request
#[tokio::test]
async fn test_cancel_in_flight() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("Date")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let fetcher = FeedFetcher::new(&format!("{}/slow", mock_server.uri())).unwrap();
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let result = FeedSource::fetch(&fetcher, &token).await;
    assert!(matches!(result, Err(FetchError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(2));
}

/// A second fetch_text call preempts the first
#[tokio::test]
async fn test_new_fetch_preempts_previous() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feed.csv"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("Date")
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&mock_server)
        .await;

    let fetcher = Arc::new(FeedFetcher::new(&format!("{}/feed.csv", mock_server.uri())).unwrap());

    let first = {
        let fetcher = Arc::clone(&fetcher);
        tokio::spawn(async move { fetcher.fetch_text().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = fetcher.fetch_text().await;

    assert!(matches!(first.await.unwrap(), Err(FetchError::Cancelled)));
    assert_eq!(second.unwrap(), "Date");
}
