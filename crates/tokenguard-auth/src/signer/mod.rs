//! Signature providers.
//!
//! A signer turns the signature string of a token (its first two encoded
//! segments) into a signature. Verification always recomputes the signature
//! and compares it in constant time, so every variant is deterministic for a
//! given secret.

pub mod crypt;
pub mod digest;
pub mod password_hash;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use subtle::ConstantTimeEq;

use tokenguard_core::error::AppError;
use tokenguard_core::result::AppResult;

pub use self::crypt::CryptSigner;
pub use self::digest::{Md5Signer, Sha1Signer};
pub use self::password_hash::PasswordHashSigner;

/// Supported signature algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Argon2id raw hash, hex encoded.
    PasswordHash,
    /// HMAC-SHA256 keyed with the scene secret, hex encoded.
    Crypt,
    /// SHA-1 over input and secret, hex encoded.
    Sha1,
    /// MD5 over input and secret, hex encoded.
    Md5,
}

impl Algorithm {
    /// Identifier written to configuration and to the `alg` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PasswordHash => "password-hash",
            Self::Crypt => "crypt",
            Self::Sha1 => "sha1",
            Self::Md5 => "md5",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "password-hash" | "password_hash" => Ok(Self::PasswordHash),
            "crypt" => Ok(Self::Crypt),
            "sha1" => Ok(Self::Sha1),
            "md5" => Ok(Self::Md5),
            other => Err(AppError::configuration(format!(
                "Unknown signature algorithm: '{other}'. Supported: password-hash, crypt, sha1, md5"
            ))),
        }
    }
}

/// Produces and checks token signatures.
pub trait Signer: Send + Sync + fmt::Debug {
    /// Algorithm implemented by this signer.
    fn algorithm(&self) -> Algorithm;

    /// Signs the given signature string.
    fn sign(&self, input: &str) -> AppResult<String>;

    /// Returns whether `signature` is the signature of `input`.
    fn verify(&self, input: &str, signature: &str) -> AppResult<bool> {
        let expected = self.sign(input)?;
        Ok(expected.as_bytes().ct_eq(signature.as_bytes()).into())
    }
}

/// Builds the signer for an algorithm keyed with `secret`.
pub fn build_signer(algorithm: Algorithm, secret: &str) -> AppResult<Arc<dyn Signer>> {
    let signer: Arc<dyn Signer> = match algorithm {
        Algorithm::PasswordHash => Arc::new(PasswordHashSigner::new(secret)?),
        Algorithm::Crypt => Arc::new(CryptSigner::new(secret)),
        Algorithm::Sha1 => Arc::new(Sha1Signer::new(secret)),
        Algorithm::Md5 => Arc::new(Md5Signer::new(secret)),
    };
    Ok(signer)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str = "eyJ0eXAiOiJqd3QifQ.eyJzdWIiOiI0MiJ9";

    #[test]
    fn test_parse_algorithm_ids() {
        assert_eq!("crypt".parse::<Algorithm>().unwrap(), Algorithm::Crypt);
        assert_eq!(
            "password-hash".parse::<Algorithm>().unwrap(),
            Algorithm::PasswordHash
        );
        assert!("rsa".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_every_signer_verifies_its_own_output() {
        for alg in [
            Algorithm::PasswordHash,
            Algorithm::Crypt,
            Algorithm::Sha1,
            Algorithm::Md5,
        ] {
            let signer = build_signer(alg, "s3cret").unwrap();
            assert_eq!(signer.algorithm(), alg);
            let sig = signer.sign(INPUT).unwrap();
            assert!(signer.verify(INPUT, &sig).unwrap(), "{alg}");
            assert!(!signer.verify("tampered.input", &sig).unwrap(), "{alg}");
            assert!(!signer.verify(INPUT, "").unwrap(), "{alg}");
        }
    }

    #[test]
    fn test_secret_changes_signature() {
        let a = build_signer(Algorithm::Crypt, "one").unwrap();
        let b = build_signer(Algorithm::Crypt, "two").unwrap();
        assert_ne!(a.sign(INPUT).unwrap(), b.sign(INPUT).unwrap());
    }
}
