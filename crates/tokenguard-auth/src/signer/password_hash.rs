//! Argon2id signer (`password-hash`).
//!
//! The hash is computed in raw mode over `input + secret` with a salt
//! derived from the secret, so the same input always yields the same
//! signature and verification is a recompute-and-compare.

use argon2::{Algorithm as Argon2Algorithm, Argon2, Params, Version};
use sha2::{Digest, Sha256};

use tokenguard_core::error::AppError;
use tokenguard_core::result::AppResult;

use super::{Algorithm, Signer};

/// Memory cost in KiB. Tokens are verified on every request.
const MEMORY_KIB: u32 = 4096;
/// Number of passes.
const ITERATIONS: u32 = 2;
/// Output length in bytes.
const OUTPUT_LEN: usize = 32;

/// Argon2id signer.
#[derive(Clone)]
pub struct PasswordHashSigner {
    secret: String,
    salt: [u8; 16],
    params: Params,
}

impl PasswordHashSigner {
    /// Creates a signer for the given secret.
    pub fn new(secret: &str) -> AppResult<Self> {
        let params = Params::new(MEMORY_KIB, ITERATIONS, 1, Some(OUTPUT_LEN))
            .map_err(|e| AppError::configuration(format!("Invalid Argon2 parameters: {e}")))?;

        let digest = Sha256::digest(secret.as_bytes());
        let mut salt = [0u8; 16];
        salt.copy_from_slice(&digest[..16]);

        Ok(Self {
            secret: secret.to_string(),
            salt,
            params,
        })
    }
}

impl std::fmt::Debug for PasswordHashSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHashSigner")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Signer for PasswordHashSigner {
    fn algorithm(&self) -> Algorithm {
        Algorithm::PasswordHash
    }

    fn sign(&self, input: &str) -> AppResult<String> {
        let argon2 = Argon2::new(
            Argon2Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        );
        let material = format!("{input}{}", self.secret);
        let mut output = [0u8; OUTPUT_LEN];
        argon2
            .hash_password_into(material.as_bytes(), &self.salt, &mut output)
            .map_err(|e| AppError::internal(format!("Argon2 hashing failed: {e}")))?;
        Ok(hex::encode(output))
    }
}
