//! Session lifecycle: issuance, validation, refresh, logout and revocation.

pub mod context;
pub mod manager;
pub mod store;

pub use context::RequestContext;
pub use manager::{SessionManager, TokenInput};
pub use store::TokenStore;
