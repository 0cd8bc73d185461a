//! Integration tests for rate-limit handling: cooldowns, advisories and the
//! retry cap.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gridscrape::{
    Advisory, AdvisorySink, DialogKind, RetryPolicy, ScrapeError, ScrapeStatus, SteamGridDb,
};

#[derive(Default)]
struct RecordingSink {
    advisories: Mutex<Vec<Advisory>>,
}

impl RecordingSink {
    fn cooldowns(&self) -> Vec<(u32, Duration)> {
        self.advisories
            .lock()
            .unwrap()
            .iter()
            .filter_map(|a| match a {
                Advisory::RateLimited {
                    attempt, cooldown, ..
                } => Some((*attempt, *cooldown)),
                _ => None,
            })
            .collect()
    }
}

impl AdvisorySink for RecordingSink {
    fn advise(&self, advisory: &Advisory) {
        self.advisories.lock().unwrap().push(advisory.clone());
    }
}

fn scraper(server: &MockServer, policy: RetryPolicy, sink: Arc<RecordingSink>) -> SteamGridDb {
    SteamGridDb::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .min_interval(Duration::ZERO)
        .retry(policy)
        .advisory_sink(sink)
        .build()
        .unwrap()
}

fn ok_search() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": 1, "name": "Halo"}]}))
}

#[tokio::test]
async fn retries_after_cooldown_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/autocomplete/Halo"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/autocomplete/Halo"))
        .respond_with(ok_search())
        .expect(1)
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingSink::default());
    let policy = RetryPolicy::new().base_cooldown(Duration::from_millis(40));
    let scraper = scraper(&server, policy, sink.clone());

    let start = Instant::now();
    let candidates = scraper.search("Halo", "PC").await.unwrap();

    assert_eq!(candidates.len(), 1);
    // Linear growth: 40ms after the first 429, 80ms after the second.
    assert_eq!(
        sink.cooldowns(),
        vec![(0, Duration::from_millis(40)), (1, Duration::from_millis(80))]
    );
    assert!(start.elapsed() >= Duration::from_millis(120));
}

#[tokio::test]
async fn gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingSink::default());
    let policy = RetryPolicy::new()
        .max_retries(2)
        .base_cooldown(Duration::from_millis(5));
    let scraper = scraper(&server, policy, sink.clone());

    let err = scraper.search("Halo", "PC").await.unwrap_err();
    assert!(matches!(err, ScrapeError::RateLimitExceeded { retries: 2 }));
    assert_eq!(err.http_status(), Some(429));
    assert_eq!(sink.cooldowns().len(), 2);

    let status = ScrapeStatus::from_error(&err);
    assert!(!status.ok);
    assert_eq!(status.dialog, Some(DialogKind::Message));
}

#[tokio::test]
async fn disabled_policy_fails_on_first_throttle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingSink::default());
    let scraper = scraper(&server, RetryPolicy::disabled(), sink.clone());

    let err = scraper.search("Halo", "PC").await.unwrap_err();
    assert!(matches!(err, ScrapeError::RateLimitExceeded { retries: 0 }));
    assert!(sink.cooldowns().is_empty());
}

#[tokio::test]
async fn throttled_result_is_cached_only_after_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/autocomplete/Halo"))
        .respond_with(ok_search())
        .expect(1)
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingSink::default());
    let policy = RetryPolicy::new().base_cooldown(Duration::from_millis(5));
    let scraper = scraper(&server, policy, sink);

    scraper.search("Halo", "PC").await.unwrap();
    scraper.search("Halo", "PC").await.unwrap();
}

#[tokio::test]
async fn advisory_names_resume_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ok_search())
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingSink::default());
    let policy = RetryPolicy::new().base_cooldown(Duration::from_millis(5));
    let before = chrono::Local::now();
    scraper(&server, policy, sink.clone())
        .search("Halo", "PC")
        .await
        .unwrap();

    let advisories = sink.advisories.lock().unwrap();
    let Advisory::RateLimited { resume_at, .. } = &advisories[0] else {
        panic!("expected a rate-limit advisory");
    };
    assert!(*resume_at >= before);
    assert!(advisories[0].message().contains("rate limit"));
}

#[test]
fn default_policy_matches_provider_guidance() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_retries, 5);
    assert_eq!(policy.base_cooldown, Duration::from_secs(120));
    assert_eq!(policy.cooldown_for_attempt(0), Duration::from_secs(120));
    assert_eq!(policy.cooldown_for_attempt(2), Duration::from_secs(360));
}
