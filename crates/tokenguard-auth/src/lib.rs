//! # tokenguard-auth
//!
//! Token lifecycle and authorization engine for Tokenguard.
//!
//! ## Modules
//!
//! - `signer`: pluggable signature providers (password-hash, crypt, sha1, md5)
//! - `token`: token model and the three-segment wire format
//! - `keyring`: per-scene secrets and registered signers
//! - `password`: Argon2id hashing of account passwords
//! - `session`: issuance, validation, refresh, logout and revocation
//! - `registry`: one session manager per configured scene
//! - `authz`: OR/AND evaluation of permission, role and post codes

pub mod authz;
pub mod error;
pub mod keyring;
pub mod password;
pub mod registry;
pub mod session;
pub mod signer;
pub mod token;

pub use authz::{CodeKind, CodeRequirement, Evaluator, JoinMode};
pub use error::{AuthError, AuthResult};
pub use keyring::{Keyring, SceneKeys};
pub use password::PasswordHasher;
pub use registry::AuthManager;
pub use session::{RequestContext, SessionManager, TokenInput, TokenStore};
pub use signer::{Algorithm, Signer};
pub use token::Token;
