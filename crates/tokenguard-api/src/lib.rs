//! # tokenguard-api
//!
//! HTTP layer for Tokenguard built on Axum.
//!
//! Provides the authentication middleware (validation with transparent
//! refresh), the `AuthUser` extractor, permission/role/post guards, the
//! auth endpoints, and error mapping.

pub mod context;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
