//! Login accounts served by the bundled identity store.

use serde::{Deserialize, Serialize};

use super::identity::Identity;

/// An identity together with its Argon2 password hash (PHC string).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// The identity issued on successful login.
    #[serde(flatten)]
    pub identity: Identity,
    /// Argon2id hash of the account password.
    pub password_hash: String,
}
