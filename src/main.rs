//! Tokenguard Server: signed session tokens with refresh and code-based
//! authorization.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use tokenguard_api::{AppState, build_router};
use tokenguard_cache::provider::CacheManager;
use tokenguard_core::config::AppConfig;
use tokenguard_core::error::AppError;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("TOKENGUARD_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

    AppConfig::load(&config_path)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Tokenguard v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Initialize cache ─────────────────────────────────
    tracing::info!(
        "Initializing cache (provider: {})...",
        config.cache.provider
    );
    let cache = Arc::new(CacheManager::new(&config.cache).await?);
    tracing::info!("Cache initialized");

    // ── Step 2: Initialize auth system ───────────────────────────
    tracing::info!("Initializing authentication system...");
    if config.accounts.is_empty() {
        tracing::warn!("No accounts configured; login will reject every request");
    }
    let addr = config.server.bind_address();
    let state = AppState::new(config, cache)?;
    let mut scenes: Vec<&str> = state.auth.scene_names().collect();
    scenes.sort_unstable();
    tracing::info!(
        scenes = ?scenes,
        default = %state.sessions().scene(),
        accounts = state.accounts.len(),
        "Authentication system initialized"
    );

    // ── Step 3: Build router ─────────────────────────────────────
    let app = build_router(state);

    // ── Step 4: Bind and serve ───────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("Listening on {addr}");

    // ── Step 5: Graceful shutdown ────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!("Tokenguard stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
