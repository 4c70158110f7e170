//! Core traits defined in `tokenguard-core` and implemented by other crates.

pub mod cache;
pub mod identity;

pub use cache::CacheProvider;
pub use identity::{IdentityProvider, StaticIdentityProvider};
