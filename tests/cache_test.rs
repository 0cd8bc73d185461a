//! Tests for the persistent scrape cache as seen through the scraper.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gridscrape::cache::{CacheKey, Namespace, ScrapeCache};
use gridscrape::{AssetKind, Candidate, MetadataRecord, ScrapeError, SteamGridDb};

fn scraper(server: &MockServer, cache_dir: &std::path::Path) -> SteamGridDb {
    SteamGridDb::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .min_interval(Duration::ZERO)
        .cache_dir(cache_dir)
        .build()
        .unwrap()
}

async fn mount_everything(server: &MockServer, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/search/autocomplete/Halo"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": 5251, "name": "Halo"}]})),
        )
        .expect(expected)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/games/id/5251"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"name": "Halo", "release_date": 1004572800}
        })))
        .expect(expected)
        .mount(server)
        .await;
    for endpoint in ["grids", "heroes", "logos"] {
        Mock::given(method("GET"))
            .and(path(format!("/{endpoint}/game/5251")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"style": "alternate", "url": format!("https://cdn/{endpoint}.png"),
                          "thumb": "https://cdn/t.png", "author": {"name": "alice"}}]
            })))
            .expect(expected)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn flushed_results_survive_a_new_session() {
    let dir = tempfile::tempdir().unwrap();

    let first_server = MockServer::start().await;
    mount_everything(&first_server, 1).await;
    let (candidates, metadata, covers) = {
        let scraper = scraper(&first_server, dir.path());
        let candidates = scraper.search("Halo", "Xbox").await.unwrap();
        let metadata = scraper.metadata(&candidates[0]).await.unwrap();
        let covers = scraper.assets(&candidates[0], AssetKind::BoxFront).await.unwrap();
        scraper.flush().unwrap();
        (candidates, metadata, covers)
    };

    for ns in [Namespace::Candidates, Namespace::Metadata, Namespace::Assets] {
        assert!(dir.path().join(ns.file_name("SteamGridDB")).exists());
    }

    // The second session never reaches the network.
    let second_server = MockServer::start().await;
    mount_everything(&second_server, 0).await;
    let scraper = scraper(&second_server, dir.path());
    assert!(scraper.has_cached_candidates("halo", "Xbox"));
    assert_eq!(scraper.search("Halo", "Xbox").await.unwrap(), candidates);
    assert_eq!(scraper.metadata(&candidates[0]).await.unwrap(), metadata);
    assert_eq!(
        scraper.assets(&candidates[0], AssetKind::BoxFront).await.unwrap(),
        covers
    );
}

#[tokio::test]
async fn unflushed_results_stay_in_memory() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ScrapeCache::open(dir.path(), "SteamGridDB");
    cache
        .metadata
        .put(&CacheKey::entity("1"), MetadataRecord::default());

    assert!(cache.metadata.has(&CacheKey::entity("1")));
    assert!(!dir.path().join(Namespace::Metadata.file_name("SteamGridDB")).exists());

    cache.flush().unwrap();
    assert!(dir.path().join(Namespace::Metadata.file_name("SteamGridDB")).exists());
}

#[tokio::test]
async fn refresh_after_invalidate_refetches() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/games/id/5251"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"name": "Halo"}})))
        .expect(2)
        .mount(&server)
        .await;

    let scraper = scraper(&server, dir.path());
    let candidate = Candidate::scored("5251", "Halo", "Xbox", "Halo");
    scraper.metadata(&candidate).await.unwrap();
    scraper.cache().metadata.invalidate(&CacheKey::entity("5251"));
    scraper.metadata(&candidate).await.unwrap();
}

#[test]
fn get_on_missing_key_is_cache_miss() {
    let cache = ScrapeCache::ephemeral();
    let err = cache.candidates.get(&CacheKey::search("Halo", "Xbox")).unwrap_err();
    assert!(matches!(
        err,
        ScrapeError::CacheMiss {
            namespace: "candidates",
            ..
        }
    ));
}

#[test]
fn corrupt_files_do_not_block_a_session() {
    let dir = tempfile::tempdir().unwrap();
    for ns in [Namespace::Candidates, Namespace::Metadata, Namespace::Assets] {
        std::fs::write(dir.path().join(ns.file_name("SteamGridDB")), "{{ not json").unwrap();
    }

    let cache = ScrapeCache::open(dir.path(), "SteamGridDB");
    assert!(cache.candidates.is_empty());

    cache.metadata.put(&CacheKey::entity("9"), MetadataRecord::default());
    cache.flush().unwrap();

    let reopened = ScrapeCache::open(dir.path(), "SteamGridDB");
    assert!(reopened.metadata.has(&CacheKey::entity("9")));
}

#[test]
fn concurrent_writers_keep_every_key() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(ScrapeCache::open(dir.path(), "SteamGridDB"));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for j in 0..25 {
                    let key = CacheKey::entity(&format!("{i}-{j}"));
                    cache.metadata.put(&key, MetadataRecord::default());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    cache.flush().unwrap();

    let reopened = ScrapeCache::open(dir.path(), "SteamGridDB");
    assert_eq!(reopened.metadata.len(), 100);
}
