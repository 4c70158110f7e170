//! Integration tests for permission guards and admin session control.

mod helpers;

use http::StatusCode;

use helpers::TestApp;

#[tokio::test]
async fn test_permission_granted() {
    let app = TestApp::new();
    let token = app.login("admin").await;

    let response = app
        .request("GET", "/api/admin/accounts", None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_permission_denied() {
    let app = TestApp::new();
    let token = app.login("viewer").await;

    let response = app
        .request("GET", "/api/admin/accounts", None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "FORBIDDEN");
    assert!(
        response.body["message"]
            .as_str()
            .unwrap()
            .contains("account:list")
    );
}

#[tokio::test]
async fn test_super_admin_bypasses_permissions() {
    let mut scene = helpers::scene();
    scene.super_admin = Some("root".to_string());
    let app = TestApp::with_scene(scene);
    let token = app.login("root").await;

    let response = app
        .request("GET", "/api/admin/accounts", None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_force_exit_invalidates_sessions() {
    let app = TestApp::new();
    let admin = app.login("admin").await;
    let viewer = app.login("viewer").await;

    let response = app
        .request("DELETE", "/api/admin/sessions/admin/viewer", None, Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.request("GET", "/api/auth/me", None, Some(&viewer)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app.request("GET", "/api/auth/me", None, Some(&admin)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_force_exit_unknown_scene() {
    let app = TestApp::new();
    let admin = app.login("admin").await;

    let response = app
        .request("DELETE", "/api/admin/sessions/nope/viewer", None, Some(&admin))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_revoke_token_by_id() {
    let app = TestApp::new();
    let admin = app.login("admin").await;
    let viewer = app.login("viewer").await;
    let jti = app
        .state
        .auth
        .parse(&viewer, true)
        .unwrap()
        .id()
        .unwrap()
        .to_string();

    let response = app
        .request("DELETE", &format!("/api/admin/tokens/{jti}"), None, Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.request("GET", "/api/auth/me", None, Some(&viewer)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "TOKEN_BLACKLISTED");
}

#[tokio::test]
async fn test_admin_route_requires_token() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/admin/accounts", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
