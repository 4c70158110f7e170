//! # tokenguard-core
//!
//! Core crate for Tokenguard. Contains the cache and identity traits,
//! configuration schemas, the identity snapshot type, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other Tokenguard crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
