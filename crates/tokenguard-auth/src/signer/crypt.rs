//! Keyed-hash signer (`crypt`): HMAC-SHA256 with the scene secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use tokenguard_core::error::AppError;
use tokenguard_core::result::AppResult;

use super::{Algorithm, Signer};

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 signer.
#[derive(Clone)]
pub struct CryptSigner {
    secret: Vec<u8>,
}

impl CryptSigner {
    /// Creates a signer keyed with `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }
}

impl std::fmt::Debug for CryptSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptSigner").finish_non_exhaustive()
    }
}

impl Signer for CryptSigner {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Crypt
    }

    fn sign(&self, input: &str) -> AppResult<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::internal(format!("Invalid HMAC key: {e}")))?;
        mac.update(input.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}
