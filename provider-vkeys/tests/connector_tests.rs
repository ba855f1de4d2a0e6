//! Integration tests for the vkeys connector against a stubbed API.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use provider_vkeys::{VkeysConfig, VkeysConnector};
use sync_traits::{ProviderError, TrackProvider, TrackQuery};

fn connector(server: &MockServer) -> VkeysConnector {
    VkeysConnector::new(VkeysConfig::new(server.uri())).unwrap()
}

async fn mount_search_hit(server: &MockServer, word: &str, id: i64) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("word", word))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": [
                { "song": "Resolved Title", "singer": "Resolved Artist", "id": id },
                { "song": "Second Hit", "singer": "Ignored", "id": id + 1 }
            ]
        })))
        .mount(server)
        .await;
}

// ============================================================
// Happy path
// ============================================================

#[tokio::test]
async fn fetch_track_runs_the_full_flow() {
    let server = MockServer::start().await;
    mount_search_hit(&server, "Artist Title", 99).await;

    Mock::given(method("GET"))
        .and(path("/geturl"))
        .and(query_param("id", "99"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": { "url": format!("{}/cdn/99.flac", server.uri()), "format": "flac" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/lyric"))
        .and(query_param("id", "99"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": { "lrc": "[00:01] line", "trans": "[00:01] translated" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cdn/99.flac"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"audio-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let bundle = connector(&server)
        .fetch_track(&TrackQuery::new("Artist", "Title"))
        .await
        .unwrap();

    assert_eq!(&bundle.audio[..], b"audio-bytes");
    assert_eq!(bundle.audio_format, "flac");
    assert_eq!(bundle.display_name, "Resolved Title - Resolved Artist");
    assert_eq!(bundle.lyrics.as_deref(), Some("[00:01] line"));
    assert_eq!(bundle.translated_lyrics.as_deref(), Some("[00:01] translated"));
}

#[tokio::test]
async fn missing_format_defaults_to_mp3_and_lyric_failure_is_tolerated() {
    let server = MockServer::start().await;
    mount_search_hit(&server, "Artist Title", 7).await;

    Mock::given(method("GET"))
        .and(path("/geturl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": { "url": format!("{}/cdn/7", server.uri()) }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/lyric"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cdn/7"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&server)
        .await;

    let bundle = connector(&server)
        .fetch_track(&TrackQuery::new("Artist", "Title"))
        .await
        .unwrap();

    assert_eq!(bundle.audio_format, "mp3");
    assert!(bundle.lyrics.is_none());
    assert!(bundle.translated_lyrics.is_none());
}

// ============================================================
// Failure classification
// ============================================================

#[tokio::test]
async fn empty_search_results_classify_as_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "code": 200, "data": [] })),
        )
        .mount(&server)
        .await;

    let err = connector(&server)
        .fetch_track(&TrackQuery::new("Nobody", "Nothing"))
        .await
        .unwrap_err();
    match err {
        ProviderError::NotFound { query } => assert_eq!(query, "Nobody - Nothing"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn non_success_envelope_code_classifies_as_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "code": 404, "data": null })),
        )
        .mount(&server)
        .await;

    let err = connector(&server)
        .fetch_track(&TrackQuery::new("A", "B"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::NotFound { .. }), "got {err:?}");
}

#[tokio::test]
async fn http_429_classifies_as_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = connector(&server)
        .fetch_track(&TrackQuery::new("A", "B"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::RateLimited { .. }), "got {err:?}");
}

#[tokio::test]
async fn download_server_error_classifies_as_transient() {
    let server = MockServer::start().await;
    mount_search_hit(&server, "A B", 5).await;

    Mock::given(method("GET"))
        .and(path("/geturl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": { "url": format!("{}/cdn/5", server.uri()), "format": "mp3" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/lyric"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "code": 200, "data": {} })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cdn/5"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = connector(&server)
        .fetch_track(&TrackQuery::new("A", "B"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Transient { .. }), "got {err:?}");
}

#[tokio::test]
async fn missing_download_url_classifies_as_malformed() {
    let server = MockServer::start().await;
    mount_search_hit(&server, "A B", 3).await;

    Mock::given(method("GET"))
        .and(path("/geturl"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": 200, "data": { "format": "mp3" } })),
        )
        .mount(&server)
        .await;

    let err = connector(&server)
        .fetch_track(&TrackQuery::new("A", "B"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Malformed { .. }), "got {err:?}");
}
