//! Recon lookups against mocked upstreams.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crtsh_client::CrtshClient;
use dossier_enrich::ManualClock;
use dossier_recon::{
    Archive, Blocklist, BlocklistSource, Lookup, LookupOutcome, ReputationLookup, ScanLookup,
    SubdomainLookup,
};
use urlscan_client::UrlscanClient;
use virustotal_client::VirusTotalClient;
use wayback_client::WaybackClient;

async fn blocklist_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metamask.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "whitelist": ["good.com"],
            "blacklist": ["Phish.io", "drain.xyz/claim"]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/scamsniffer.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["scam.net"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/destroy.json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    server
}

fn sources(server: &MockServer) -> Vec<BlocklistSource> {
    vec![
        BlocklistSource::new("MetaMask", &format!("{}/metamask.json", server.uri())),
        BlocklistSource::new("ScamSniffer", &format!("{}/scamsniffer.json", server.uri())),
        BlocklistSource::new("PhishDestroy", &format!("{}/destroy.json", server.uri())),
    ]
}

#[tokio::test]
async fn blocklist_merges_sources_and_reuses_fresh_cache() {
    let server = blocklist_server().await;
    let dir = tempfile::tempdir().unwrap();
    let blocklist = Blocklist::with_sources(dir.path(), sources(&server)).unwrap();

    // First check fills the cache; the second must not refetch (each mock expects 1 hit).
    assert!(blocklist.check("drain.xyz").await.unwrap());
    assert!(blocklist.check("SCAM.net").await.unwrap());
    assert!(!blocklist.check("good.com").await.unwrap());

    let cache: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(blocklist.cache_path()).unwrap()).unwrap();
    assert_eq!(cache["domains"], json!(["drain.xyz", "phish.io", "scam.net"]));
    assert!(cache["updated"].is_string());
}

#[tokio::test]
async fn blocklist_lookup_reports_domain_and_flag() {
    let server = blocklist_server().await;
    let dir = tempfile::tempdir().unwrap();
    let blocklist = Blocklist::with_sources(dir.path(), sources(&server)).unwrap();

    let outcome = blocklist.lookup("phish.io").await.unwrap();
    assert_eq!(
        outcome,
        LookupOutcome::Found(json!({ "domain": "phish.io", "blocked": true }))
    );
}

#[tokio::test]
async fn stale_cache_is_refreshed() {
    let server = blocklist_server().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("blocklist_cache.json"),
        r#"{"updated":"2020-01-01T00:00:00+00:00","domains":["old.com"]}"#,
    )
    .unwrap();
    let blocklist = Blocklist::with_sources(dir.path(), sources(&server)).unwrap();

    assert!(!blocklist.check("old.com").await.unwrap());
    assert!(blocklist.check("phish.io").await.unwrap());
}

#[tokio::test]
async fn subdomains_from_certificates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("q", "%.bad.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name_value": "www.bad.com\n*.bad.com" },
            { "name_value": "API.bad.com" },
            { "name_value": "www.bad.com" }
        ])))
        .mount(&server)
        .await;

    let lookup = SubdomainLookup::new(CrtshClient::with_base_url(&server.uri()).unwrap());
    assert_eq!(
        lookup.lookup("bad.com").await.unwrap(),
        LookupOutcome::Found(json!(["api.bad.com", "www.bad.com"]))
    );
}

#[tokio::test]
async fn certificate_search_failure_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>overloaded</html>"))
        .mount(&server)
        .await;

    let lookup = SubdomainLookup::new(CrtshClient::with_base_url(&server.uri()).unwrap());
    assert_eq!(lookup.lookup("bad.com").await.unwrap(), LookupOutcome::NotFound);
}

#[tokio::test]
async fn reputation_without_key_is_skipped() {
    let lookup = ReputationLookup::new(None);
    assert!(matches!(
        lookup.lookup("bad.com").await.unwrap(),
        LookupOutcome::Skipped(_)
    ));
}

#[tokio::test]
async fn reputation_report_is_saved_whole() {
    let server = MockServer::start().await;
    let report = json!({
        "data": { "attributes": { "last_analysis_stats": { "malicious": 3, "harmless": 60 } } }
    });
    Mock::given(method("GET"))
        .and(path("/domains/bad.com"))
        .and(header("x-apikey", "vt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(report.clone()))
        .mount(&server)
        .await;

    let client = VirusTotalClient::with_base_url(&server.uri(), "vt".into()).unwrap();
    let lookup = ReputationLookup::new(Some(client));
    assert_eq!(lookup.lookup("bad.com").await.unwrap(), LookupOutcome::Found(report));
}

#[tokio::test]
async fn scan_lookup_without_key_is_skipped() {
    let server = MockServer::start().await;
    let client = UrlscanClient::with_base_url(&server.uri()).unwrap();
    let lookup = ScanLookup::new(client, None);
    assert!(matches!(
        lookup.lookup("bad.com").await.unwrap(),
        LookupOutcome::Skipped(_)
    ));
}

#[tokio::test]
async fn scan_lookup_keeps_existing_scans() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("size", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "_id": "a" }, { "_id": "b" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/scan/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = UrlscanClient::with_base_url(&server.uri()).unwrap();
    let lookup = ScanLookup::new(client, Some("k".into()));
    assert_eq!(
        lookup.lookup("bad.com").await.unwrap(),
        LookupOutcome::Found(json!([{ "_id": "a" }, { "_id": "b" }]))
    );
}

#[tokio::test]
async fn scan_lookup_submits_when_nothing_exists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/scan/"))
        .and(header("API-Key", "k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "uuid": "fresh" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/result/fresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task": { "uuid": "fresh" } })))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let client = UrlscanClient::with_base_url(&server.uri()).unwrap();
    let lookup = ScanLookup::with_clock(client, Some("k".into()), clock.clone());

    assert_eq!(
        lookup.lookup("bad.com").await.unwrap(),
        LookupOutcome::Found(json!([{ "task": { "uuid": "fresh" } }]))
    );
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(15)]);
}

#[tokio::test]
async fn bulk_archive_check_pauses_between_urls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wayback/available"))
        .and(query_param("url", "https://old.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "archived_snapshots": { "closest": {
                "available": true,
                "url": "http://web.archive.org/web/20200102030405/https://old.com",
                "timestamp": "20200102030405",
                "status": "200"
            } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wayback/available"))
        .and(query_param("url", "https://new.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "archived_snapshots": {} })))
        .mount(&server)
        .await;

    let client = WaybackClient::with_base_urls(
        &format!("{}/wayback/available", server.uri()),
        &server.uri(),
    )
    .unwrap();
    let clock = Arc::new(ManualClock::new());
    let archive = Archive::with_clock(client, clock.clone());

    let results = archive
        .bulk(&["old.com".to_string(), "new.com".to_string()])
        .await;

    assert!(results["old.com"].archived);
    assert_eq!(results["old.com"].date.as_deref(), Some("2020-01-02 03:04:05"));
    assert!(!results["new.com"].archived);
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(1); 2]);
}

#[tokio::test]
async fn snapshot_is_saved_under_host_and_timestamp() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/web/20230115id_/https:/+www\.example\.com$"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>old</html>"))
        .mount(&server)
        .await;

    let client = WaybackClient::with_base_urls(
        &format!("{}/wayback/available", server.uri()),
        &server.uri(),
    )
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let saved = Archive::new(client)
        .save_snapshot("www.example.com", Some("20230115"), dir.path())
        .await
        .unwrap();

    assert_eq!(saved, dir.path().join("www_example_com_20230115.html"));
    assert_eq!(std::fs::read_to_string(saved).unwrap(), "<html>old</html>");
}
