use std::sync::Arc;

use axum::http::StatusCode;
use playlist_proxy::server::error::Error;
use playlist_proxy::server::services::playlist_services::{
    PlaylistService, PlaylistServiceTrait, validate_source_url,
};
use playlist_proxy::{
    Channel, DynKeyValueStore, KeyValueStore, KvPlaylistRepository, MemoryStore, PLAYLIST_INDEX_KEY,
    PlaylistSummary, playlist_key,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ONE_CHANNEL: &str = "#EXTM3U\n#EXTINF:-1,Channel One\nhttp://cdn.example.com/one/index.m3u8\n";

fn service(store: &Arc<MemoryStore>) -> PlaylistService {
    let store = store.clone() as DynKeyValueStore;
    PlaylistService::new(
        Arc::new(KvPlaylistRepository::new(store)),
        reqwest::Client::new(),
    )
}

async fn serve_m3u(server: &MockServer, at: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "audio/x-mpegurl"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_ingest_then_list_and_get() {
    let upstream = MockServer::start().await;
    serve_m3u(&upstream, "/list.m3u", ONE_CHANNEL).await;

    let store = Arc::new(MemoryStore::new());
    let playlists = service(&store);

    let url = format!("{}/list.m3u", upstream.uri());
    let id = playlists
        .ingest(&url, Some("Test".to_string()))
        .await
        .unwrap();

    assert_eq!(
        playlists.list().await.unwrap(),
        vec![PlaylistSummary {
            id: id.clone(),
            name: "Test".to_string(),
            count: 1,
        }]
    );
    assert_eq!(
        playlists.get(&id).await.unwrap(),
        vec![Channel {
            name: "Channel One".to_string(),
            url: "http://cdn.example.com/one/index.m3u8".to_string(),
        }]
    );

    // one playlist record plus the index
    assert_eq!(store.len().await, 2);
    assert!(store.get(&playlist_key(&id)).await.unwrap().is_some());
    assert_ne!(playlist_key(&id), PLAYLIST_INDEX_KEY);
}

#[tokio::test]
async fn test_list_keeps_insertion_order() {
    let upstream = MockServer::start().await;
    serve_m3u(&upstream, "/a.m3u", ONE_CHANNEL).await;
    serve_m3u(&upstream, "/b.m3u", "#EXTM3U\nhttp://x/1.ts\nhttp://x/2.ts\n").await;

    let store = Arc::new(MemoryStore::new());
    let playlists = service(&store);

    let first = playlists
        .ingest(&format!("{}/a.m3u", upstream.uri()), Some("Zulu".to_string()))
        .await
        .unwrap();
    let second = playlists
        .ingest(&format!("{}/b.m3u", upstream.uri()), Some("Alpha".to_string()))
        .await
        .unwrap();

    assert_ne!(first, second);

    let summaries = playlists.list().await.unwrap();
    let ids: Vec<&str> = summaries.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec![first.as_str(), second.as_str()]);
    assert_eq!(summaries[1].count, 2);
}

#[tokio::test]
async fn test_empty_playlist_is_kept_and_named_after_url() {
    let upstream = MockServer::start().await;
    serve_m3u(&upstream, "/empty.m3u", "#EXTM3U\n").await;

    let store = Arc::new(MemoryStore::new());
    let playlists = service(&store);

    let url = format!("{}/empty.m3u", upstream.uri());
    let id = playlists
        .ingest(&url, Some("   ".to_string()))
        .await
        .unwrap();

    let summaries = playlists.list().await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].name, url);
    assert_eq!(summaries[0].count, 0);
    assert!(playlists.get(&id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upstream_404_writes_nothing() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.m3u"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&upstream)
        .await;

    let store = Arc::new(MemoryStore::new());
    let playlists = service(&store);

    let result = playlists
        .ingest(&format!("{}/missing.m3u", upstream.uri()), None)
        .await;

    assert!(matches!(result, Err(Error::UpstreamStatus(StatusCode::NOT_FOUND))));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_unreachable_upstream_is_a_fetch_error() {
    let store = Arc::new(MemoryStore::new());
    let playlists = service(&store);

    let result = playlists.ingest("http://127.0.0.1:1/list.m3u", None).await;

    assert!(matches!(result, Err(Error::UpstreamFetch(_))));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_invalid_urls_write_nothing() {
    let store = Arc::new(MemoryStore::new());
    let playlists = service(&store);

    for url in ["", "   ", "not a url", "ftp://example.com/list.m3u", "/relative.m3u"] {
        let result = playlists.ingest(url, Some("x".to_string())).await;
        assert!(matches!(result, Err(Error::BadRequest(_))), "{:?}", url);
    }

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let playlists = service(&store);

    assert!(matches!(
        playlists.get("does-not-exist").await,
        Err(Error::NotFound(_))
    ));
    assert!(playlists.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_source_keeps_content_type() {
    let upstream = MockServer::start().await;
    serve_m3u(&upstream, "/raw.m3u", ONE_CHANNEL).await;

    let store = Arc::new(MemoryStore::new());
    let playlists = service(&store);

    let source = playlists
        .fetch_source(&format!("{}/raw.m3u", upstream.uri()))
        .await
        .unwrap();

    assert_eq!(source.body, ONE_CHANNEL);
    assert_eq!(source.content_type.as_deref(), Some("audio/x-mpegurl"));
    assert!(store.is_empty().await);
}

#[test]
fn test_validate_source_url() {
    assert!(validate_source_url("https://example.com/list.m3u").is_ok());
    assert!(validate_source_url(" http://example.com:8080/a?b=c ").is_ok());
    assert!(validate_source_url("mailto:someone@example.com").is_err());
    assert!(validate_source_url("https://").is_err());
}
