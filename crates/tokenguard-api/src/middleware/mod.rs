//! Axum middleware stack.

pub mod auth;
pub mod authz;
pub mod logging;
