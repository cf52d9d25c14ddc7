//! Tests for the middleware pipeline: security headers, host validation,
//! rate limiting, the admin guard, and health reporting.

use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn security_headers_reach_every_response() {
    let app = common::spawn_app(common::test_config()).await;

    // A success, an error, and a not-found all carry the header set.
    let paths = ["/health", "/api/v1/users/999999", "/no/such/route"];
    for path in paths {
        let res = app.client.get(app.url(path)).send().await.unwrap();
        let headers = res.headers();
        assert_eq!(
            headers.get("x-content-type-options").unwrap(),
            "nosniff",
            "path {path:?}"
        );
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert_eq!(
            headers.get("referrer-policy").unwrap(),
            "strict-origin-when-cross-origin"
        );
        assert!(headers.get("permissions-policy").is_some());
    }
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = common::spawn_app(common::test_config()).await;
    let res = app.client.get(app.url("/health")).send().await.unwrap();
    let id = res.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert!(!id.is_empty());
}

#[tokio::test]
async fn untrusted_host_is_rejected() {
    let mut config = common::test_config();
    config.security.allowed_hosts = vec!["api.example.com".to_string()];
    let app = common::spawn_app(config).await;

    // The client's Host header is 127.0.0.1, which is not allow-listed.
    let res = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Security headers apply even to the rejection.
    assert_eq!(
        res.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "Invalid host header");
}

#[tokio::test]
async fn strict_limit_applies_to_writes_only() {
    let mut config = common::test_config();
    config.rate_limit.enabled = true;
    config.rate_limit.write_max_requests = 3;
    config.rate_limit.write_window_secs = 60;
    config.rate_limit.read_max_requests = 100;
    let app = common::spawn_app(config).await;

    // Three writes pass (handler outcome does not matter to the limiter).
    for i in 0..3 {
        let res = app
            .client
            .post(app.url("/api/v1/users"))
            .json(&json!({"name": format!("U{i}"), "email": format!("u{i}@x.com")}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    // The fourth write in the window is rejected with a retry hint.
    let res = app
        .client
        .post(app.url("/api/v1/users"))
        .json(&json!({"name": "U4", "email": "u4@x.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.headers().get("retry-after").unwrap(), "60");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["retry_after"], 60);
    assert!(body["detail"].as_str().unwrap().contains("Too many requests"));

    // Reads use the lenient tier and still go through.
    let res = app
        .client
        .get(app.url("/api/v1/users"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_stats_require_the_configured_key() {
    let mut config = common::test_config();
    config.admin.enabled = true;
    config.admin.api_key = "test-admin-key".to_string();
    let app = common::spawn_app(config).await;

    let res = app
        .client
        .post(app.url("/api/v1/users"))
        .json(&json!({"name": "A", "email": "a@x.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let url = app.url("/api/v1/users/stats/summary");

    let res = app.client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .client
        .get(&url)
        .bearer_auth("wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .client
        .get(&url)
        .bearer_auth("test-admin-key")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let stats: Value = res.json().await.unwrap();
    assert_eq!(stats["total_users"], 1);
    assert_eq!(stats["active_users"], 1);
}

#[tokio::test]
async fn health_reports_database_state() {
    let app = common::spawn_app(common::test_config()).await;
    let res = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn root_banner_points_at_health() {
    let app = common::spawn_app(common::test_config()).await;
    let res = app.client.get(app.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["health"], "/health");
}
