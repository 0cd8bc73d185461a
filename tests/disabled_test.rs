//! A scraper without an API key stays offline and says so once.

use std::sync::{Arc, Mutex};

use wiremock::{Mock, MockServer, ResponseTemplate};

use gridscrape::{
    AUTH_DOCS_URL, Advisory, AdvisorySink, AssetKind, Candidate, DialogKind, Scraper, SteamGridDb,
    UNKNOWN_TITLE,
};

#[derive(Default)]
struct RecordingSink {
    advisories: Mutex<Vec<Advisory>>,
}

impl AdvisorySink for RecordingSink {
    fn advise(&self, advisory: &Advisory) {
        self.advisories.lock().unwrap().push(advisory.clone());
    }
}

async fn silent_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    server
}

fn disabled(server: &MockServer, key: Option<&str>, sink: Arc<RecordingSink>) -> SteamGridDb {
    let mut builder = SteamGridDb::builder()
        .base_url(server.uri())
        .advisory_sink(sink);
    if let Some(key) = key {
        builder = builder.api_key(key);
    }
    builder.build().unwrap()
}

#[tokio::test]
async fn operations_return_empty_results_without_network() {
    let server = silent_server().await;
    let sink = Arc::new(RecordingSink::default());
    let scraper = disabled(&server, None, sink);
    let candidate = Candidate::scored("5251", "Halo", "Xbox", "Halo");

    assert!(!scraper.is_enabled());
    assert!(scraper.search("Halo", "Xbox").await.unwrap().is_empty());
    assert_eq!(scraper.metadata(&candidate).await.unwrap().title, UNKNOWN_TITLE);
    assert!(
        scraper
            .assets(&candidate, AssetKind::BoxFront)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn blank_key_disables() {
    let server = silent_server().await;
    let scraper = disabled(&server, Some("   "), Arc::new(RecordingSink::default()));
    assert!(!scraper.is_enabled());
    assert!(scraper.search("Halo", "Xbox").await.unwrap().is_empty());
}

#[tokio::test]
async fn credential_check_points_at_docs() {
    let server = silent_server().await;
    let scraper = disabled(&server, Some(""), Arc::new(RecordingSink::default()));

    let status = Scraper::check_credentials(&scraper);
    assert!(!status.ok);
    assert!(status.message.contains(AUTH_DOCS_URL));
    assert_eq!(status.dialog, Some(DialogKind::Message));
}

#[tokio::test]
async fn missing_key_notice_is_published_once() {
    let server = silent_server().await;
    let sink = Arc::new(RecordingSink::default());
    let scraper = disabled(&server, None, sink.clone());
    let candidate = Candidate::scored("1", "Halo", "Xbox", "Halo");

    scraper.check_credentials();
    scraper.search("Halo", "Xbox").await.unwrap();
    scraper.metadata(&candidate).await.unwrap();
    scraper.check_credentials();

    let advisories = sink.advisories.lock().unwrap();
    assert_eq!(advisories.len(), 1);
    assert!(matches!(
        &advisories[0],
        Advisory::MissingCredentials { provider } if provider == "SteamGridDB"
    ));
}

#[test]
fn key_present_passes_credential_check() {
    let scraper = SteamGridDb::builder().api_key("abc").build().unwrap();
    let status = scraper.check_credentials();
    assert!(status.ok);
    assert!(scraper.is_enabled());
}
