//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use tokenguard_api::{AppState, build_router};
use tokenguard_auth::PasswordHasher;
use tokenguard_cache::provider::CacheManager;
use tokenguard_core::config::{AppConfig, SceneConfig};
use tokenguard_core::types::{Account, Identity};

pub const PASSWORD: &str = "correct horse battery staple";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Application state, for direct access to the session engine
    pub state: AppState,
}

/// Test response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `data.token` of a token response.
    pub fn token(&self) -> String {
        self.body["data"]["token"]
            .as_str()
            .expect("response carries a token")
            .to_string()
    }

    /// Machine-readable error code of an error response.
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

/// Scene used by every test app: fast HMAC signing, one-hour lifetime.
pub fn scene() -> SceneConfig {
    let mut scene = SceneConfig::with_secret("integration-secret");
    scene.algorithm = "crypt".to_string();
    scene.ttl = 3600;
    scene.refresh_ttl = 3600;
    scene.retry_time = 0;
    scene
}

fn accounts() -> Vec<Account> {
    let hash = PasswordHasher::new()
        .hash_password(PASSWORD)
        .expect("Failed to hash password");
    [
        Identity::new("admin")
            .with_permissions(["account:list", "session:kick"])
            .with_roles(["admin"]),
        Identity::new("viewer").with_roles(["viewer"]),
        Identity::new("root"),
    ]
    .into_iter()
    .map(|identity| Account {
        identity,
        password_hash: hash.clone(),
    })
    .collect()
}

impl TestApp {
    /// Create a test application with the default scene.
    pub fn new() -> Self {
        Self::with_scene(scene())
    }

    /// Create a test application with a custom default scene.
    pub fn with_scene(scene: SceneConfig) -> Self {
        let mut config = AppConfig::default();
        config.auth.scenes.insert(config.auth.default_scene.clone(), scene);
        config.accounts = accounts();

        let state = AppState::new(config, Arc::new(CacheManager::in_memory()))
            .expect("Failed to build app state");
        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    /// Make a request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);

        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let request = if let Some(body) = body {
            builder
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap()
        } else {
            builder.body(Body::empty()).unwrap()
        };

        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Log in and return the token.
    pub async fn login(&self, id: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/auth/login",
                Some(serde_json::json!({ "id": id, "password": PASSWORD })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.token()
    }
}
