//! UrlscanSource against a mocked urlscan API, with time driven by a manual clock.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dossier_enrich::{EnrichmentSource, ManualClock, UrlscanSource};
use urlscan_client::UrlscanClient;

async fn source(server: &MockServer, keys: &[&str], clock: &Arc<ManualClock>) -> UrlscanSource {
    let client = UrlscanClient::with_base_url(&server.uri()).unwrap();
    UrlscanSource::with_clock(
        client,
        keys.iter().map(|k| k.to_string()).collect(),
        clock.clone(),
    )
}

fn backoffs(clock: &ManualClock, at_least: Duration) -> usize {
    clock.sleeps().iter().filter(|d| **d >= at_least).count()
}

#[tokio::test]
async fn search_hit_with_screenshot_is_used_directly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("q", "domain:foo.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "_id": "u1",
                "screenshot": "https://urlscan.io/screenshots/u1.png",
                "page": { "ip": "1.2.3.4", "country": "US", "title": "Foo" }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let found = source(&server, &[], &clock)
        .await
        .search("foo.com")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.uuid, "u1");
    assert_eq!(found.screenshot, "https://urlscan.io/screenshots/u1.png");
    assert_eq!(found.ip, "1.2.3.4");
    assert_eq!(found.country, "US");
    assert_eq!(found.title, "Foo");
}

#[tokio::test]
async fn hit_without_screenshot_falls_back_to_the_result_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "_id": "u2" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/result/u2/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task": { "screenshotURL": "https://urlscan.io/screenshots/u2.png" },
            "page": { "ip": "5.6.7.8", "country": "DE" },
            "verdicts": { "overall": { "malicious": true } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let found = source(&server, &[], &clock)
        .await
        .search("foo.com")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.uuid, "u2");
    assert_eq!(found.screenshot, "https://urlscan.io/screenshots/u2.png");
    assert_eq!(found.country, "DE");
    assert!(found.malicious);
}

#[tokio::test]
async fn empty_search_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let found = source(&server, &[], &clock).await.search("nothing.com").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn rate_limit_then_success_backs_off_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "_id": "u3", "screenshot": "https://urlscan.io/screenshots/u3.png" }]
        })))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let found = source(&server, &[], &clock).await.search("foo.com").await.unwrap();

    assert_eq!(found.unwrap().uuid, "u3");
    assert_eq!(backoffs(&clock, Duration::from_secs(60)), 1);
}

#[tokio::test]
async fn persistent_rate_limit_gives_up_after_one_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let found = source(&server, &[], &clock).await.search("foo.com").await.unwrap();

    assert!(found.is_none());
    assert_eq!(backoffs(&clock, Duration::from_secs(60)), 1);
}

#[tokio::test]
async fn server_error_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let found = source(&server, &[], &clock).await.search("foo.com").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn unexpected_client_error_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(422).set_body_string("unprocessable"))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let found = source(&server, &[], &clock).await.search("bad.com").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn forbidden_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let result = source(&server, &[], &clock).await.search("foo.com").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn unauthorized_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let result = source(&server, &[], &clock).await.search("foo.com").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn submit_without_key_is_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scan/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let source = source(&server, &[], &clock).await;

    assert!(!source.can_submit());
    assert!(source.submit("foo.com").await.unwrap().is_none());
}

#[tokio::test]
async fn submit_waits_for_the_scan_to_settle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scan/"))
        .and(header("API-Key", "k1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": "new-1",
            "message": "Submission successful"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/result/new-1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": { "ip": "9.9.9.9" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let source = source(&server, &["k1"], &clock).await;
    let found = source.submit("foo.com").await.unwrap().unwrap();

    // No screenshotURL in the result, so the public location is used.
    assert_eq!(found.screenshot, "https://urlscan.io/screenshots/new-1.png");
    assert_eq!(found.ip, "9.9.9.9");
    assert!(clock.sleeps().contains(&Duration::from_secs(15)));
}

#[tokio::test]
async fn rejected_submission_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scan/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "DNS Error - Could not resolve domain"
        })))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let source = source(&server, &["k1"], &clock).await;
    assert!(source.submit("gone.example").await.unwrap().is_none());
}

#[tokio::test]
async fn result_still_pending_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scan/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "uuid": "slow" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/result/slow/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let source = source(&server, &["k1"], &clock).await;
    assert!(source.submit("foo.com").await.unwrap().is_none());
}
