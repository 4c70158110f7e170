//! # tokenguard-cache
//!
//! Cache provider implementations for Tokenguard. Supports two modes:
//!
//! - **memory**: In-process cache using [moka](https://crates.io/crates/moka)
//!   with per-entry expiry. Suitable for a single node.
//! - **redis**: Redis-backed cache using the [redis](https://crates.io/crates/redis)
//!   crate. Required when several nodes share blacklists and refresh locks.
//!
//! The provider is selected at runtime based on configuration.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::CacheManager;
