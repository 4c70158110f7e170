//! Health check handler.

use axum::Json;
use axum::extract::State;
use tracing::warn;

use tokenguard_core::traits::CacheProvider;

use crate::dto::response::HealthResponse;
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = match state.cache.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            warn!(error = %e, "Cache health check failed");
            false
        }
    };

    let mut scenes: Vec<String> = state.auth.scene_names().map(str::to_string).collect();
    scenes.sort();

    Json(HealthResponse {
        status: if cache { "ok" } else { "degraded" }.to_string(),
        cache,
        version: env!("CARGO_PKG_VERSION").to_string(),
        scenes,
    })
}
