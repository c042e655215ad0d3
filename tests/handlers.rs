//! Handler-level tests using tower::ServiceExt::oneshot.
//!
//! Tests the full Axum router against a wiremock DAM without binding a TCP
//! listener for the service itself.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sku_videos::config::Config;
use sku_videos::server::{build_router, state::AppState};
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ASSET_A: &str = "AAAAAAAA11112222333344445555AAAA";
const ASSET_B: &str = "BBBBBBBB11112222333344445555BBBB";

/// Build a test config pointing both DAM and stream host at `upstream`.
fn test_config(upstream: &str) -> Config {
    Config {
        port: 0,
        is_dev: true,
        dam_base_url: upstream.to_string(),
        dam_token: "test-token".to_string(),
        stream_base_url: upstream.to_string(),
        cache_ttl: Duration::from_secs(600),
        refresh_interval: Duration::from_secs(480),
        refresh_on_start: false,
        page_size: 100,
        fetch_concurrency: 4,
        request_timeout: Duration::from_secs(5),
        upstream_max_attempts: 1,
    }
}

/// DAM with asset A (SKU "X") and asset B (SKU "Y"), both live.
async fn fake_dam() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/media/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": ASSET_A }, { "id": ASSET_B }])),
        )
        .mount(&server)
        .await;

    for (id, sku) in [(ASSET_A, "X"), (ASSET_B, "Y")] {
        Mock::given(method("GET"))
            .and(path(format!("/api/v4/media/{id}/")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "name": format!("{sku}.mp4"),
                "mediaName": format!("Video for {sku}"),
                "dateCreated": "2024-05-01T10:00:00Z",
                "dateModified": "2024-05-02T10:00:00Z",
                "thumbnails": { "webimage": format!("https://cdn.example.com/{sku}.jpg") },
                "property_Usage_Rights": ["Website"],
                "property_SKU": [sku],
            })))
            .mount(&server)
            .await;
    }

    Mock::given(method("HEAD"))
        .and(path_regex(r"^/vod-stream/[0-9a-f-]{36}/play-hls2\.m3u8$"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    server
}

fn app_for(upstream: &MockServer) -> Router {
    let state = AppState::new(test_config(&upstream.uri())).expect("state should build");
    build_router(state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

// ── Health and descriptor ───────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_200_with_json() {
    let upstream = MockServer::start().await;
    let (status, json) = get(app_for(&upstream), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn root_lists_routes() {
    let upstream = MockServer::start().await;
    let (status, json) = get(app_for(&upstream), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["endpoints"]["health"], "/health");
    assert_eq!(json["endpoints"]["videos"], "/videos/{sku}");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let upstream = MockServer::start().await;
    let (status, _) = get(app_for(&upstream), "/nonexistent").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Videos endpoint ─────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_sku_segment_returns_400() {
    let upstream = MockServer::start().await;

    for uri in ["/videos/", "/videos", "/videos/%20"] {
        let (status, json) = get(app_for(&upstream), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["error"], "SKU parameter is required");
    }
}

#[tokio::test]
async fn matching_sku_returns_its_videos() {
    let upstream = fake_dam().await;
    let (status, json) = get(app_for(&upstream), "/videos/X").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["sku"], "X");
    assert_eq!(json["count"], 1);
    assert!(json["timestamp"].is_string());

    let video = &json["videos"][0];
    assert_eq!(video["id"], ASSET_A);
    assert_eq!(video["name"], "Video for X");
    assert_eq!(
        video["streamUrl"],
        format!(
            "{}/vod-stream/aaaaaaaa-1111-2222-3333-44445555aaaa/play-hls2.m3u8",
            upstream.uri()
        )
    );
    assert_eq!(video["thumbnails"]["webimage"], "https://cdn.example.com/X.jpg");
    assert_eq!(video["dateCreated"], "2024-05-01T10:00:00Z");
    assert!(video.get("skus").is_none());
}

#[tokio::test]
async fn unknown_sku_returns_empty_list() {
    let upstream = fake_dam().await;
    let (status, json) = get(app_for(&upstream), "/videos/UNKNOWN").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 0);
    assert_eq!(json["videos"], json!([]));
}

#[tokio::test]
async fn second_query_is_served_from_cache() {
    let upstream = fake_dam().await;
    let app = app_for(&upstream);

    get(app.clone(), "/videos/X").await;
    get(app.clone(), "/videos/Y").await;

    let listings = upstream
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/api/v4/media/")
        .count();
    assert_eq!(listings, 1, "fresh cache must not hit the DAM again");
}

#[tokio::test]
async fn upstream_outage_on_cold_cache_returns_empty_list() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&upstream)
        .await;

    let (status, json) = get(app_for(&upstream), "/videos/X").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["sku"], "X");
    assert_eq!(json["count"], 0);
    assert_eq!(json["videos"], json!([]));
}

#[tokio::test]
async fn metrics_endpoint_renders_text() {
    let upstream = fake_dam().await;
    let app = app_for(&upstream);
    get(app.clone(), "/videos/X").await;

    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(ct.starts_with("text/plain"), "unexpected content-type {ct}");
}
