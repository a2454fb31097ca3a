//! HTTP API tests against the router, without a listener or poller.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

mod common;

use common::{body_json, get, post_json, test_router};

// ── GET /api/config ────────────────────────────────────────────

#[tokio::test]
async fn test_get_default_config() {
    let (app, _store, _dir) = test_router();

    let resp = app.oneshot(get("/api/config")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["mode"], "led");
    assert_eq!(json["status"], "success");
    assert!(json["last_updated"].is_string());
    assert!(json.get("web_url").is_none());
    assert!(json.get("chromecast_name").is_none());
}

#[tokio::test]
async fn test_get_unrecognized_mode_is_500() {
    let (app, store, _dir) = test_router();
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(store.path(), r#"{"mode":"hologram"}"#).unwrap();
    store.load().await.unwrap();

    let resp = app.oneshot(get("/api/config")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await, json!({"error": "Mode not valid"}));
}

// ── POST /api/config ───────────────────────────────────────────

#[tokio::test]
async fn test_post_chromecast_then_get() {
    let (app, _store, _dir) = test_router();

    let before = body_json(app.clone().oneshot(get("/api/config")).await.unwrap()).await;

    let resp = app
        .clone()
        .oneshot(post_json(
            "/api/config",
            json!({"mode": "chromecast", "chromecast_name": "TV", "youtube_video_id": "abc123"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let posted = body_json(resp).await;
    assert_eq!(posted["chromecast_name"], "TV");

    let after = body_json(app.oneshot(get("/api/config")).await.unwrap()).await;
    assert_eq!(after["mode"], "chromecast");
    assert_eq!(after["chromecast_name"], "TV");
    assert_eq!(after["youtube_video_id"], "abc123");
    assert_eq!(after["status"], "success");
    assert_eq!(after, posted);
    // Same fixed-width layout, so string order is time order.
    assert!(after["last_updated"].as_str().unwrap() > before["last_updated"].as_str().unwrap());
}

#[tokio::test]
async fn test_post_each_mode_round_trips_fields() {
    let (app, _store, _dir) = test_router();

    let payloads = [
        json!({"mode": "web", "web_url": "https://example.com/dashboard"}),
        json!({"mode": "powerpoint", "ppt_email": "slides@example.org"}),
        json!({"mode": "chromecast", "chromecast_name": "Lobby", "youtube_video_id": "xyz"}),
        json!({"mode": "led"}),
    ];

    let mut last = String::new();
    for payload in payloads {
        let resp = app
            .clone()
            .oneshot(post_json("/api/config", payload.clone()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let got = body_json(app.clone().oneshot(get("/api/config")).await.unwrap()).await;
        for (key, value) in payload.as_object().unwrap() {
            assert_eq!(&got[key], value, "{key}");
        }
        let stamp = got["last_updated"].as_str().unwrap().to_string();
        assert!(stamp > last);
        last = stamp;
    }
}

#[tokio::test]
async fn test_post_invalid_mode_names_allowed_set() {
    let (app, _store, _dir) = test_router();

    for body in [json!({}), json!({"mode": "laser"}), json!({"web_url": "https://x.io"})] {
        let resp = app
            .clone()
            .oneshot(post_json("/api/config", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            json!({"error": "mode must be one of: led, web, chromecast, powerpoint"})
        );
    }
}

#[tokio::test]
async fn test_post_empty_body_is_missing_mode() {
    let (app, _store, _dir) = test_router();

    let req = Request::post("/api/config").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert!(json["error"].as_str().unwrap().starts_with("mode must be one of"));
}

#[tokio::test]
async fn test_post_malformed_json() {
    let (app, store, _dir) = test_router();
    let before = store.snapshot();

    let req = Request::post("/api/config")
        .header("content-type", "application/json")
        .body(Body::from("{ nope"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await, json!({"error": "Request body must be valid JSON"}));
    assert_eq!(*store.snapshot(), *before);
}

#[tokio::test]
async fn test_post_bad_email_is_rejected() {
    let (app, store, _dir) = test_router();

    let resp = app
        .oneshot(post_json(
            "/api/config",
            json!({"mode": "powerpoint", "ppt_email": "not-an-email"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert!(json["error"].as_str().unwrap().contains("valid email"));

    assert_eq!(store.snapshot().mode, "led");
    assert!(!store.path().exists());
}

#[tokio::test]
async fn test_post_invalid_web_url() {
    let (app, _store, _dir) = test_router();

    let resp = app
        .oneshot(post_json("/api/config", json!({"mode": "web", "web_url": "not a url"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await, json!({"error": "web_url must be a valid url"}));
}

#[tokio::test]
async fn test_chromecast_settings_survive_mode_switch() {
    let (app, _store, _dir) = test_router();

    let resp = app
        .clone()
        .oneshot(post_json(
            "/api/config",
            json!({"mode": "chromecast", "chromecast_name": "TV", "youtube_video_id": "abc123"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(post_json("/api/config", json!({"mode": "led"})))
        .await
        .unwrap();
    let led = body_json(resp).await;
    assert!(led.get("chromecast_name").is_none());

    let resp = app
        .clone()
        .oneshot(post_json("/api/config", json!({"mode": "chromecast"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let got = body_json(app.oneshot(get("/api/config")).await.unwrap()).await;
    assert_eq!(got["mode"], "chromecast");
    assert_eq!(got["chromecast_name"], "TV");
    assert_eq!(got["youtube_video_id"], "abc123");
}

#[tokio::test]
async fn test_fresh_install_requires_mode_fields() {
    let (app, store, _dir) = test_router();

    let resp = app
        .clone()
        .oneshot(post_json("/api/config", json!({"mode": "web"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await, json!({"error": "web_url required for web mode"}));

    let resp = app
        .oneshot(post_json("/api/config", json!({"mode": "chromecast"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await,
        json!({"error": "chromecast_name and youtube_video_id required for chromecast mode"})
    );
    assert!(!store.path().exists());
}

#[tokio::test]
async fn test_fields_from_file_are_retained() {
    let (app, store, _dir) = test_router();
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(
        store.path(),
        r#"{"mode":"led","webUrl":"https://example.com/board"}"#,
    )
    .unwrap();
    store.load().await.unwrap();

    let resp = app
        .oneshot(post_json("/api/config", json!({"mode": "web"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["web_url"], "https://example.com/board");
}

#[tokio::test]
async fn test_post_writes_canonical_file() {
    let (app, store, _dir) = test_router();

    let resp = app
        .oneshot(post_json(
            "/api/config",
            json!({"mode": "web", "web_url": "https://example.com", "extra": true}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let on_disk: serde_json::Value =
        serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
    assert_eq!(on_disk["mode"], "web");
    assert_eq!(on_disk["webUrl"], "https://example.com");
    assert_eq!(on_disk["chromecastName"], "Chromecast name");
    assert!(on_disk.get("extra").is_none());
    assert!(on_disk["lastUpdated"].is_string());
}

#[tokio::test]
async fn test_post_save_failure_is_500() {
    let (app, store, _dir) = test_router();
    // A directory at the config path makes every write fail.
    std::fs::create_dir_all(store.path()).unwrap();
    std::fs::write(store.path().join("occupied"), "x").unwrap();

    let resp = app
        .oneshot(post_json("/api/config", json!({"mode": "led"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await, json!({"error": "Internal server error"}));
}

// ── GET /api/status ────────────────────────────────────────────

#[tokio::test]
async fn test_status_before_and_after_first_save() {
    let (app, store, _dir) = test_router();

    let json = body_json(app.clone().oneshot(get("/api/status")).await.unwrap()).await;
    assert_eq!(json["status"], "running");
    assert_eq!(json["config_loaded"], false);
    assert_eq!(json["polling_active"], false);
    assert_eq!(json["config_file_path"], store.path().display().to_string());
    assert!(json["timestamp"].is_string());

    app.clone()
        .oneshot(post_json("/api/config", json!({"mode": "led"})))
        .await
        .unwrap();

    let json = body_json(app.oneshot(get("/api/status")).await.unwrap()).await;
    assert_eq!(json["config_loaded"], true);
    assert_eq!(json["polling_active"], true);
}

// ── Fallbacks ──────────────────────────────────────────────────

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _store, _dir) = test_router();

    let resp = app.clone().oneshot(get("/api/unknown")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await, json!({"error": "Endpoint not found"}));

    let req = Request::delete("/api/config").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await, json!({"error": "Endpoint not found"}));
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let (app, _store, _dir) = test_router();

    let resp = app.oneshot(get("/api/status")).await.unwrap();
    assert!(resp.headers().contains_key("x-request-id"));
}
