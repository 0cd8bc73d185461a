//! Tests for request spacing and shared cooldowns.

use std::time::{Duration, Instant};

use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use gridscrape::{RateLimiter, SteamGridDb};

#[tokio::test]
async fn consecutive_calls_are_spaced() {
    let limiter = RateLimiter::new(Duration::from_millis(50));

    let start = Instant::now();
    for _ in 0..3 {
        limiter.throttle().await;
    }

    // First call is immediate; the next two each wait one interval.
    assert!(start.elapsed() >= Duration::from_millis(90));
}

#[tokio::test]
async fn clones_share_one_budget() {
    let limiter = RateLimiter::new(Duration::from_millis(50));
    let other = limiter.clone();

    let start = Instant::now();
    limiter.throttle().await;
    other.throttle().await;
    limiter.throttle().await;

    assert!(start.elapsed() >= Duration::from_millis(90));
}

#[tokio::test]
async fn separate_limiters_are_independent() {
    let a = RateLimiter::new(Duration::from_millis(200));
    let b = RateLimiter::new(Duration::from_millis(200));

    let start = Instant::now();
    a.throttle().await;
    b.throttle().await;

    assert!(start.elapsed() < Duration::from_millis(150));
}

#[tokio::test(start_paused = true)]
async fn cooldown_holds_back_every_clone() {
    let limiter = RateLimiter::unthrottled();
    let other = limiter.clone();
    let start = tokio::time::Instant::now();

    let cooling = limiter.clone();
    let handle = tokio::spawn(async move { cooling.cool_down(Duration::from_secs(240)).await });
    tokio::task::yield_now().await;
    assert!(other.is_cooling_down().await);

    other.throttle().await;
    assert!(start.elapsed() >= Duration::from_secs(240));
    handle.await.unwrap();
}

#[tokio::test]
async fn scrapers_sharing_a_limiter_are_paced_together() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(4)
        .mount(&server)
        .await;

    let limiter = RateLimiter::new(Duration::from_millis(50));
    let build = || {
        SteamGridDb::builder()
            .api_key("test-key")
            .base_url(server.uri())
            .rate_limiter(limiter.clone())
            .build()
            .unwrap()
    };
    let first = build();
    let second = build();

    let start = Instant::now();
    first.search("a", "PC").await.unwrap();
    second.search("b", "PC").await.unwrap();
    first.search("c", "PC").await.unwrap();
    second.search("d", "PC").await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(140));
}

#[test]
fn default_spacing_is_100ms() {
    assert_eq!(RateLimiter::default().min_interval(), Duration::from_millis(100));
}
