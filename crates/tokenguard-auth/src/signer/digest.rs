//! Plain digest signers: `hex(H(input + secret))`.

use md5::Md5;
use sha1::{Digest, Sha1};

use tokenguard_core::result::AppResult;

use super::{Algorithm, Signer};

/// Hex MD5 of arbitrary bytes. Also used for token ids, device
/// fingerprints and refresh lock keys.
pub fn md5_hex(data: impl AsRef<[u8]>) -> String {
    hex::encode(Md5::digest(data.as_ref()))
}

/// SHA-1 signer.
#[derive(Clone)]
pub struct Sha1Signer {
    secret: String,
}

impl Sha1Signer {
    /// Creates a SHA-1 signer for the given secret.
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
        }
    }
}

impl std::fmt::Debug for Sha1Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sha1Signer").finish_non_exhaustive()
    }
}

impl Signer for Sha1Signer {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Sha1
    }

    fn sign(&self, input: &str) -> AppResult<String> {
        let mut hasher = Sha1::new();
        hasher.update(input.as_bytes());
        hasher.update(self.secret.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

/// MD5 signer.
#[derive(Clone)]
pub struct Md5Signer {
    secret: String,
}

impl Md5Signer {
    /// Creates an MD5 signer for the given secret.
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
        }
    }
}

impl std::fmt::Debug for Md5Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Md5Signer").finish_non_exhaustive()
    }
}

impl Signer for Md5Signer {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Md5
    }

    fn sign(&self, input: &str) -> AppResult<String> {
        Ok(md5_hex(format!("{input}{}", self.secret)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_md5_hex_known_value() {
        assert_eq!(md5_hex(""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_digest_signers_append_secret() {
        let md5 = Md5Signer::new("key");
        assert_eq!(md5.sign("value").unwrap(), md5_hex("valuekey"));

        let sha1 = Sha1Signer::new("");
        // sha1("abc")
        assert_eq!(
            sha1.sign("abc").unwrap(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }
}
