//! Integration tests for the token lifecycle over HTTP.

mod helpers;

use std::time::Duration;

use http::StatusCode;

use helpers::{PASSWORD, TestApp};

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({
                "id": "viewer",
                "password": PASSWORD,
                "claims": { "tenant": "acme" },
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["token_type"], "Bearer");
    assert_eq!(response.token().split('.').count(), 3);

    let token = app.state.auth.parse(&response.token(), true).unwrap();
    assert_eq!(token.subject().as_deref(), Some("viewer"));
    assert_eq!(token.claim("tenant"), Some(&serde_json::json!("acme")));
}

#[tokio::test]
async fn test_login_invalid_password() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "id": "viewer", "password": "wrong" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_unknown_account() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "id": "nobody", "password": PASSWORD })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_missing_fields() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "id": "", "password": "" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_me_requires_token() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/auth/me", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "AUTH_REQUIRED");
}

#[tokio::test]
async fn test_me_returns_identity() {
    let app = TestApp::new();
    let token = app.login("admin").await;

    let response = app.request("GET", "/api/auth/me", None, Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["id"], "admin");
    assert_eq!(data["scene"], "admin");
    assert_eq!(data["role_codes"], serde_json::json!(["admin"]));
    assert_eq!(data["super_admin"], false);
}

#[tokio::test]
async fn test_token_in_query_parameter() {
    let app = TestApp::new();
    let token = app.login("viewer").await;

    let response = app
        .request("GET", &format!("/api/auth/me?token={token}"), None, None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_tampered_token_rejected() {
    let app = TestApp::new();
    let token = app.login("viewer").await;
    let forged = app.login("admin").await;
    let mut parts: Vec<&str> = token.split('.').collect();
    parts[1] = forged.split('.').nth(1).unwrap();

    let response = app
        .request("GET", "/api/auth/me", None, Some(&parts.join(".")))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = TestApp::new();
    let token = app.login("viewer").await;

    let response = app
        .request("POST", "/api/auth/logout", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.request("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "TOKEN_BLACKLISTED");
}

#[tokio::test]
async fn test_expired_token_refreshed_transparently() {
    let mut scene = helpers::scene();
    scene.ttl = 2;
    let app = TestApp::with_scene(scene);
    let token = app.login("viewer").await;

    tokio::time::sleep(Duration::from_millis(3100)).await;

    let response = app.request("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);

    let header = response
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .expect("refreshed token header");
    let fresh = header.strip_prefix("Bearer ").unwrap();
    assert_ne!(fresh, token);

    // The old token was blacklisted by the refresh.
    let ctx = tokenguard_auth::RequestContext::new();
    let old = app.state.sessions().validate(
        &ctx,
        Some(&token),
    );
    assert!(matches!(
        old.await,
        Err(tokenguard_auth::AuthError::Blacklisted)
    ));

    // A request racing the refresh with the old token receives the same
    // replacement instead of a 401.
    let response = app.request("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers.get("authorization").and_then(|v| v.to_str().ok()),
        Some(header)
    );

    let response = app.request("GET", "/api/auth/me", None, Some(fresh)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_expired_token_without_auto_refresh() {
    let mut scene = helpers::scene();
    scene.ttl = 2;
    scene.auto_refresh = false;
    let app = TestApp::with_scene(scene);
    let token = app.login("viewer").await;

    tokio::time::sleep(Duration::from_millis(3100)).await;

    let response = app.request("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(response.error_code(), "TOKEN_EXPIRED");

    let response = app
        .request("POST", "/api/auth/refresh", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let fresh = response.token();

    let response = app.request("GET", "/api/auth/me", None, Some(&fresh)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_window_elapsed() {
    let mut scene = helpers::scene();
    scene.ttl = 1;
    scene.refresh_ttl = 0;
    scene.stateful = false;
    let app = TestApp::with_scene(scene);
    let token = app.login("viewer").await;

    tokio::time::sleep(Duration::from_millis(2100)).await;

    let response = app
        .request("POST", "/api/auth/refresh", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "REFRESH_WINDOW_ELAPSED");
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["scenes"], serde_json::json!(["admin"]));
}
