use axum::body::Body;
use bytes::Bytes;
use cinestash::config::AppConfig;
use cinestash::routes::build_router;
use cinestash::state::AppState;
use http::header;
use http::Request;
use http::StatusCode;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const ADMIN_TOKEN: &str = "test-admin-token-12345";
const MEMBER_TOKEN: &str = "test-member-token-67890";

fn test_config(uploads_dir: &str) -> AppConfig {
    AppConfig {
        admin_token: ADMIN_TOKEN.to_string(),
        member_tokens: vec![MEMBER_TOKEN.to_string()],
        host: "127.0.0.1".to_string(),
        port: 0,
        uploads_dir: uploads_dir.to_string(),
        max_upload_size: 104_857_600,
        temp_max_age_secs: 86_400,
        temp_sweep_interval_secs: 3_600,
        log_level: "error".to_string(),
        cors_allowed_origins: "*".to_string(),
    }
}

fn setup() -> (AppState, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let uploads_dir = tmp.path().join("uploads");
    let config = test_config(uploads_dir.to_str().unwrap());

    std::fs::create_dir_all(config.temp_uploads_dir()).unwrap();

    let state = AppState::new(config);
    (state, tmp)
}

fn bearer(token: &str) -> (http::HeaderName, http::HeaderValue) {
    (
        header::AUTHORIZATION,
        http::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

async fn body_to_bytes(body: Body) -> Bytes {
    body.collect().await.unwrap().to_bytes()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = body_to_bytes(body).await;
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_request(
    token: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> Request<Body> {
    let boundary = "test-boundary-7MA4YWxkTrZu0gW";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let (key, val) = bearer(token);
    Request::builder()
        .method("POST")
        .uri("/api/v1/uploads")
        .header(key, val)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

// Helper: stage an upload through the API and return its temp URL
async fn stage_test_upload(
    state: &AppState,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> String {
    let app = build_router(state.clone());
    let req = multipart_request(ADMIN_TOKEN, filename, content_type, data);
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = body_to_json(resp.into_body()).await;
    body["data"]["url"].as_str().unwrap().to_string()
}

// Helper: create a movie as admin and return its parsed body
async fn create_test_movie(state: &AppState, payload: Value) -> Value {
    let app = build_router(state.clone());
    let (key, val) = bearer(ADMIN_TOKEN);
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/movies")
        .header(key, val)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&payload).unwrap()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_to_json(resp.into_body()).await
}

fn basename(url: &str) -> &str {
    url.rsplit('/').next().unwrap()
}

// ==================== Health Tests ====================

#[tokio::test]
async fn test_health_returns_200() {
    let (state, _tmp) = setup();
    let app = build_router(state);

    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = body_to_json(resp.into_body()).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_status_without_auth_returns_401() {
    let (state, _tmp) = setup();
    let app = build_router(state);

    let req = Request::builder()
        .uri("/api/v1/status")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_status_with_member_auth_returns_200() {
    let (state, _tmp) = setup();
    let app = build_router(state);

    let (key, val) = bearer(MEMBER_TOKEN);
    let req = Request::builder()
        .uri("/api/v1/status")
        .header(key, val)
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = body_to_json(resp.into_body()).await;
    assert_eq!(body["data"]["movie_count"], 0);
    assert!(body["data"]["uptime_seconds"].is_number());
    assert!(body["data"]["version"].is_string());
}

// ==================== Upload Intake Tests ====================

#[tokio::test]
async fn test_upload_without_auth_returns_401() {
    let (state, _tmp) = setup();
    let app = build_router(state);

    let mut req = multipart_request(ADMIN_TOKEN, "clip.mp4", "video/mp4", b"data");
    req.headers_mut().remove(header::AUTHORIZATION);

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_mp4_is_staged() {
    let (state, _tmp) = setup();
    let app = build_router(state.clone());

    let req = multipart_request(MEMBER_TOKEN, "Trailer.MP4", "video/mp4", b"mp4 bytes");
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = body_to_json(resp.into_body()).await;
    let url = body["data"]["url"].as_str().unwrap();
    assert!(url.starts_with("/uploads/tmp/"));
    assert!(url.ends_with(".mp4"));
    assert_eq!(body["data"]["size_bytes"], 9);
    assert_eq!(body["data"]["content_type"], "video/mp4");

    let staged = state.store.staged_path(basename(url));
    assert_eq!(std::fs::read(staged).unwrap(), b"mp4 bytes");
}

#[tokio::test]
async fn test_upload_text_file_rejected_with_nothing_staged() {
    let (state, _tmp) = setup();
    let app = build_router(state.clone());

    let req = multipart_request(ADMIN_TOKEN, "notes.txt", "text/plain", b"not media");
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let body: Value = body_to_json(resp.into_body()).await;
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("text/plain"));

    let staged: Vec<_> = std::fs::read_dir(state.store.temp_dir())
        .unwrap()
        .collect();
    assert!(staged.is_empty());
}

#[tokio::test]
async fn test_upload_without_file_field_returns_400() {
    let (state, _tmp) = setup();
    let app = build_router(state);

    let boundary = "test-boundary-7MA4YWxkTrZu0gW";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--{boundary}--\r\n"
    );
    let (key, val) = bearer(ADMIN_TOKEN);
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/uploads")
        .header(key, val)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_discard_upload_is_idempotent() {
    let (state, _tmp) = setup();
    let url = stage_test_upload(&state, "poster.png", "image/png", b"png").await;

    for _ in 0..2 {
        let app = build_router(state.clone());
        let (key, val) = bearer(ADMIN_TOKEN);
        let req = Request::builder()
            .method("DELETE")
            .uri("/api/v1/uploads")
            .header(key, val)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::to_string(&json!({ "url": url })).unwrap(),
            ))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = body_to_json(resp.into_body()).await;
        assert_eq!(body["data"]["removed"], true);
    }

    assert!(!state.store.staged_path(basename(&url)).exists());
}

#[tokio::test]
async fn test_discard_non_temp_url_reports_not_removed() {
    let (state, _tmp) = setup();
    let app = build_router(state);

    let (key, val) = bearer(MEMBER_TOKEN);
    let req = Request::builder()
        .method("DELETE")
        .uri("/api/v1/uploads")
        .header(key, val)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"url":"/uploads/already-public.png"}"#))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = body_to_json(resp.into_body()).await;
    assert_eq!(body["data"]["removed"], false);
}

// ==================== Movie Tests ====================

#[tokio::test]
async fn test_create_movie_as_member_returns_403() {
    let (state, _tmp) = setup();
    let app = build_router(state);

    let (key, val) = bearer(MEMBER_TOKEN);
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/movies")
        .header(key, val)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"title":"Heat"}"#))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_movie_empty_title_returns_400() {
    let (state, _tmp) = setup();
    let app = build_router(state);

    let (key, val) = bearer(ADMIN_TOKEN);
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/movies")
        .header(key, val)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"title":""}"#))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_movie_promotes_staged_poster() {
    let (state, _tmp) = setup();
    let temp_url = stage_test_upload(&state, "poster.png", "image/png", b"poster").await;
    let filename = basename(&temp_url).to_string();

    let body = create_test_movie(
        &state,
        json!({ "title": "Heat", "poster_url": temp_url }),
    )
    .await;

    assert_eq!(
        body["data"]["poster_url"],
        format!("/uploads/{}", filename)
    );
    assert!(!state.store.staged_path(&filename).exists());
    assert_eq!(
        std::fs::read(state.store.published_path(&filename)).unwrap(),
        b"poster"
    );
}

#[tokio::test]
async fn test_create_movie_passes_foreign_urls_through() {
    let (state, _tmp) = setup();

    let body = create_test_movie(
        &state,
        json!({
            "title": "Heat",
            "poster_url": "https://images.example.com/heat.jpg"
        }),
    )
    .await;

    assert_eq!(
        body["data"]["poster_url"],
        "https://images.example.com/heat.jpg"
    );
}

#[tokio::test]
async fn test_get_movie_not_found_returns_404() {
    let (state, _tmp) = setup();
    let app = build_router(state);

    let (key, val) = bearer(MEMBER_TOKEN);
    let req = Request::builder()
        .uri(format!("/api/v1/movies/{}", uuid::Uuid::new_v4()))
        .header(key, val)
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_movies_returns_paginated() {
    let (state, _tmp) = setup();
    create_test_movie(&state, json!({ "title": "Alien" })).await;
    create_test_movie(&state, json!({ "title": "Blade Runner" })).await;

    let app = build_router(state);
    let (key, val) = bearer(MEMBER_TOKEN);
    let req = Request::builder()
        .uri("/api/v1/movies?page=1&per_page=10&sort=title")
        .header(key, val)
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = body_to_json(resp.into_body()).await;
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["movies"][0]["title"], "Alien");
}

#[tokio::test]
async fn test_update_movie_replaces_and_cleans_up_poster() {
    let (state, _tmp) = setup();
    let first_url = stage_test_upload(&state, "first.png", "image/png", b"first").await;
    let first_name = basename(&first_url).to_string();

    let created = create_test_movie(
        &state,
        json!({ "title": "Heat", "poster_url": first_url }),
    )
    .await;
    let movie_id = created["data"]["id"].as_str().unwrap().to_string();
    assert!(state.store.published_path(&first_name).exists());

    let second_url = stage_test_upload(&state, "second.png", "image/png", b"second").await;
    let second_name = basename(&second_url).to_string();

    let app = build_router(state.clone());
    let (key, val) = bearer(ADMIN_TOKEN);
    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/api/v1/movies/{}", movie_id))
        .header(key, val)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({ "poster_url": second_url })).unwrap(),
        ))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = body_to_json(resp.into_body()).await;
    assert_eq!(
        body["data"]["poster_url"],
        format!("/uploads/{}", second_name)
    );

    // New poster promoted, old one unlinked.
    assert!(state.store.published_path(&second_name).exists());
    assert!(!state.store.published_path(&first_name).exists());
}

#[tokio::test]
async fn test_delete_movie_removes_promoted_files() {
    let (state, _tmp) = setup();
    let temp_url = stage_test_upload(&state, "poster.png", "image/png", b"poster").await;
    let filename = basename(&temp_url).to_string();

    let created = create_test_movie(
        &state,
        json!({ "title": "Heat", "poster_url": temp_url }),
    )
    .await;
    let movie_id = created["data"]["id"].as_str().unwrap().to_string();
    assert!(state.store.published_path(&filename).exists());

    let app = build_router(state.clone());
    let (key, val) = bearer(ADMIN_TOKEN);
    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/v1/movies/{}", movie_id))
        .header(key, val)
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    assert!(!state.store.published_path(&filename).exists());

    // GET should now 404
    let app = build_router(state);
    let (key, val) = bearer(ADMIN_TOKEN);
    let req = Request::builder()
        .uri(format!("/api/v1/movies/{}", movie_id))
        .header(key, val)
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_movie_cleans_up_patched_poster() {
    let (state, _tmp) = setup();
    let temp_url = stage_test_upload(&state, "poster.png", "image/png", b"poster").await;
    let filename = basename(&temp_url).to_string();

    let created = create_test_movie(&state, json!({ "title": "Heat" })).await;
    let movie_id = created["data"]["id"].as_str().unwrap().to_string();

    // Attach the staged poster via PATCH, then delete the movie:
    // nothing may remain in either directory.
    let app = build_router(state.clone());
    let (key, val) = bearer(ADMIN_TOKEN);
    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/api/v1/movies/{}", movie_id))
        .header(key, val)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({ "poster_url": temp_url })).unwrap(),
        ))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let app = build_router(state.clone());
    let (key, val) = bearer(ADMIN_TOKEN);
    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/v1/movies/{}", movie_id))
        .header(key, val)
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    assert!(!state.store.staged_path(&filename).exists());
    assert!(!state.store.published_path(&filename).exists());
}

// ==================== Media Serving Tests ====================

#[tokio::test]
async fn test_serve_staged_file_is_public_and_uncached() {
    let (state, _tmp) = setup();
    let temp_url = stage_test_upload(&state, "poster.png", "image/png", b"png bytes").await;

    let app = build_router(state);
    let req = Request::builder()
        .uri(temp_url.as_str())
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap().to_str().unwrap(),
        "image/png"
    );
    assert_eq!(
        resp.headers()
            .get("cache-control")
            .unwrap()
            .to_str()
            .unwrap(),
        "no-store"
    );

    let bytes = body_to_bytes(resp.into_body()).await;
    assert_eq!(&bytes[..], b"png bytes");
}

#[tokio::test]
async fn test_serve_promoted_file_is_cacheable() {
    let (state, _tmp) = setup();
    let temp_url = stage_test_upload(&state, "poster.png", "image/png", b"png bytes").await;
    let filename = basename(&temp_url).to_string();
    create_test_movie(&state, json!({ "title": "Heat", "poster_url": temp_url })).await;

    let app = build_router(state);
    let req = Request::builder()
        .uri(format!("/uploads/{}", filename))
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("cache-control")
            .unwrap()
            .to_str()
            .unwrap(),
        "public, max-age=31536000"
    );
}

#[tokio::test]
async fn test_serve_missing_file_returns_404() {
    let (state, _tmp) = setup();
    let app = build_router(state);

    let req = Request::builder()
        .uri("/uploads/nope.png")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_serve_rejects_path_traversal() {
    let (state, _tmp) = setup();
    let app = build_router(state);

    let req = Request::builder()
        .uri("/uploads/../secret.txt")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
