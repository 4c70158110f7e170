//! Shared domain types.

pub mod account;
pub mod identity;

pub use account::Account;
pub use identity::Identity;
