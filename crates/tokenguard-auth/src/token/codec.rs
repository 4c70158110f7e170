//! Wire format: `b64url(json(headers)).b64url(json(payload)).b64url(signature)`.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use serde_json::{Map, Value};

use crate::error::{AuthError, AuthResult};
use crate::keyring::Keyring;

use super::Token;

/// Prefix accepted in front of a token string.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Base64url without padding.
pub fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decodes a base64url segment, tolerating trailing padding.
pub fn decode_segment(segment: &str) -> AuthResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| AuthError::invalid(format!("segment is not base64url: {e}")))
}

pub(crate) fn base64_standard(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub(crate) fn signature_string(headers: &Map<String, Value>, payload: &Map<String, Value>) -> String {
    let headers = Value::Object(headers.clone()).to_string();
    let payload = Value::Object(payload.clone()).to_string();
    format!(
        "{}.{}",
        encode_segment(headers.as_bytes()),
        encode_segment(payload.as_bytes())
    )
}

/// Removes an optional `Bearer ` prefix and surrounding whitespace.
pub fn strip_bearer(raw: &str) -> &str {
    let raw = raw.trim();
    raw.strip_prefix(BEARER_PREFIX).unwrap_or(raw).trim()
}

fn decode_object(segment: &str, what: &str) -> AuthResult<Map<String, Value>> {
    let bytes = decode_segment(segment)?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AuthError::invalid(format!("{what} is not a JSON object"))),
        Err(e) => Err(AuthError::invalid(format!("{what} is not valid JSON: {e}"))),
    }
}

impl Token {
    /// Parses a token string.
    ///
    /// The scene is recovered from the `sce` header and must be known to the
    /// keyring. With `verify_signature`, the signer named by the `alg` header
    /// (the scene default when absent) must accept the signature. Skipping
    /// verification is only meant for read-only introspection.
    pub fn parse(raw: &str, keyring: &Keyring, verify_signature: bool) -> AuthResult<Self> {
        let raw = strip_bearer(raw);
        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() != 3 {
            return Err(AuthError::invalid(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        }

        let headers = decode_object(segments[0], "header")?;
        let payload = decode_object(segments[1], "payload")?;

        let scene = headers
            .get("sce")
            .and_then(Value::as_str)
            .ok_or_else(|| AuthError::invalid("missing scene header"))?
            .to_string();
        let keys = keyring
            .scene(&scene)
            .ok_or_else(|| AuthError::invalid(format!("unknown scene '{scene}'")))?;

        if verify_signature {
            let signature = String::from_utf8(decode_segment(segments[2])?)
                .map_err(|_| AuthError::invalid("signature is not UTF-8"))?;
            let signer = keys.signer(headers.get("alg").and_then(Value::as_str))?;
            let signature_string = format!("{}.{}", segments[0], segments[1]);
            if !signer.verify(&signature_string, &signature)? {
                return Err(AuthError::InvalidSignature);
            }
        }

        Ok(Token::from_parts(headers, payload, scene))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokenguard_core::config::{AuthConfig, SceneConfig};

    fn keyring() -> Keyring {
        let mut config = AuthConfig::default();
        let mut scene = SceneConfig::with_secret("codec-secret");
        scene.algorithm = "sha1".to_string();
        scene.drivers = vec!["md5".to_string()];
        config.scenes.insert("admin".to_string(), scene);
        let mut api = SceneConfig::with_secret("api-secret");
        api.algorithm = "crypt".to_string();
        config.scenes.insert("api".to_string(), api);
        Keyring::from_config(&config).unwrap()
    }

    fn sample(keyring: &Keyring) -> (Token, String) {
        let keys = keyring.scene("admin").unwrap();
        let mut token = Token::new("admin");
        token
            .set_claim("sub", "42")
            .set_claim("iat", 1_700_000_000)
            .set_claim("exp", 1_700_086_400)
            .set_claim("iss", "localhost")
            .set_claim("tenant", "acme");
        let encoded = token.encode(keys).unwrap();
        (token, encoded)
    }

    #[test]
    fn test_encode_parse_preserves_token() {
        let keyring = keyring();
        let (token, encoded) = sample(&keyring);
        let parsed = Token::parse(&encoded, &keyring, true).unwrap();
        assert_eq!(parsed, token);
        assert_eq!(parsed.algorithm(), Some("sha1"));
        assert!(parsed.id().is_some());
    }

    #[test]
    fn test_segments_are_unpadded_base64url() {
        let keyring = keyring();
        let (_, encoded) = sample(&keyring);
        assert_eq!(encoded.split('.').count(), 3);
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
    }

    #[test]
    fn test_bearer_prefix_is_stripped() {
        let keyring = keyring();
        let (token, encoded) = sample(&keyring);
        let parsed = Token::parse(&format!("Bearer {encoded}"), &keyring, true).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn test_malformed_strings_are_invalid() {
        let keyring = keyring();
        let (_, encoded) = sample(&keyring);
        let parts: Vec<&str> = encoded.split('.').collect();
        let not_json = encode_segment(b"not json");
        let array = encode_segment(b"[1,2]");
        let cases = [
            String::new(),
            "abc".to_string(),
            "a.b".to_string(),
            format!("{encoded}.extra"),
            format!("!!!.{}.{}", parts[1], parts[2]),
            format!("{not_json}.{}.{}", parts[1], parts[2]),
            format!("{}.{array}.{}", parts[0], parts[2]),
        ];
        for case in cases {
            let err = Token::parse(&case, &keyring, true).unwrap_err();
            assert!(matches!(err, AuthError::InvalidToken(_)), "{case}: {err:?}");
        }
    }

    #[test]
    fn test_unknown_scene_is_invalid() {
        let keyring = keyring();
        let headers = encode_segment(br#"{"typ":"jwt","sce":"ghost"}"#);
        let payload = encode_segment(br#"{"sub":"1"}"#);
        let raw = format!("{headers}.{payload}.{}", encode_segment(b"sig"));
        assert!(matches!(
            Token::parse(&raw, &keyring, false),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_tampered_payload_fails_signature() {
        let keyring = keyring();
        let (_, encoded) = sample(&keyring);
        let parts: Vec<&str> = encoded.split('.').collect();
        let forged = encode_segment(br#"{"sub":"1","exp":9999999999}"#);
        let raw = format!("{}.{forged}.{}", parts[0], parts[2]);
        assert!(matches!(
            Token::parse(&raw, &keyring, true),
            Err(AuthError::InvalidSignature)
        ));
        // Introspection does not check the signature.
        let peeked = Token::parse(&raw, &keyring, false).unwrap();
        assert_eq!(peeked.subject().as_deref(), Some("1"));
    }

    #[test]
    fn test_registered_driver_verifies_rotated_token() {
        let keyring = keyring();
        let keys = keyring.scene("admin").unwrap();
        let md5 = keys.signer(Some("md5")).unwrap();

        let mut token = Token::new("admin");
        token.set_header("alg", "md5").set_claim("sub", "1");
        token.ensure_id(keys.secret());
        let sig = md5.sign(&token.signature_string()).unwrap();
        let raw = format!(
            "{}.{}",
            token.signature_string(),
            encode_segment(sig.as_bytes())
        );
        assert!(Token::parse(&raw, &keyring, true).is_ok());
    }

    #[test]
    fn test_unregistered_algorithm_is_invalid() {
        let keyring = keyring();
        let headers = encode_segment(br#"{"typ":"jwt","sce":"admin","alg":"crypt"}"#);
        let payload = encode_segment(br#"{"sub":"1"}"#);
        let raw = format!("{headers}.{payload}.{}", encode_segment(b"sig"));
        assert!(matches!(
            Token::parse(&raw, &keyring, true),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_other_scene_secret_does_not_verify() {
        let keyring = keyring();
        let (_, encoded) = sample(&keyring);
        let parts: Vec<&str> = encoded.split('.').collect();
        // Re-point the header at the api scene, keep the admin signature.
        let headers = encode_segment(br#"{"typ":"jwt","sce":"api","alg":"crypt"}"#);
        let raw = format!("{headers}.{}.{}", parts[1], parts[2]);
        assert!(matches!(
            Token::parse(&raw, &keyring, true),
            Err(AuthError::InvalidSignature)
        ));
    }
}
