//! Token model.
//!
//! A token is an ordered header map, a claim map (payload) and the scene it
//! belongs to. Header order is preserved because the token id is derived from
//! the serialized headers.

pub mod codec;

use serde_json::{Map, Value};

use crate::keyring::SceneKeys;
use crate::signer::digest::md5_hex;

/// Constant `typ` header value.
pub const TOKEN_TYPE: &str = "jwt";

/// Claims managed by the session engine. Everything else is a custom claim
/// carried forward on refresh.
pub const REGISTERED_CLAIMS: [&str; 4] = ["sub", "iat", "exp", "iss"];

/// A session token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    headers: Map<String, Value>,
    payload: Map<String, Value>,
    scene: String,
}

impl Token {
    /// Creates an empty token for `scene` with the `typ` and `sce` headers set.
    pub fn new(scene: impl Into<String>) -> Self {
        let scene = scene.into();
        let mut headers = Map::new();
        headers.insert("typ".to_string(), Value::from(TOKEN_TYPE));
        headers.insert("sce".to_string(), Value::from(scene.as_str()));
        Self {
            headers,
            payload: Map::new(),
            scene,
        }
    }

    pub(crate) fn from_parts(
        headers: Map<String, Value>,
        payload: Map<String, Value>,
        scene: String,
    ) -> Self {
        Self {
            headers,
            payload,
            scene,
        }
    }

    /// Scene the token belongs to.
    pub fn scene(&self) -> &str {
        &self.scene
    }

    pub fn headers(&self) -> &Map<String, Value> {
        &self.headers
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    pub fn header(&self, name: &str) -> Option<&Value> {
        self.headers.get(name)
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }

    /// Sets a header, keeping the position of an existing one.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets a claim, keeping the position of an existing one.
    pub fn set_claim(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.payload.insert(name.into(), value.into());
        self
    }

    /// Token id (`jti` header).
    pub fn id(&self) -> Option<&str> {
        self.headers.get("jti").and_then(Value::as_str)
    }

    /// Device fingerprint (`age` header).
    pub fn fingerprint(&self) -> Option<&str> {
        self.headers.get("age").and_then(Value::as_str)
    }

    /// Signing algorithm id (`alg` header).
    pub fn algorithm(&self) -> Option<&str> {
        self.headers.get("alg").and_then(Value::as_str)
    }

    /// Subject claim rendered as a string, whether stored as a JSON string
    /// or number.
    pub fn subject(&self) -> Option<String> {
        match self.payload.get("sub")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn issued_at(&self) -> Option<i64> {
        self.payload.get("iat").and_then(Value::as_i64)
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.payload.get("exp").and_then(Value::as_i64)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.payload.get("iss").and_then(Value::as_str)
    }

    /// Claims other than `sub`, `iat`, `exp` and `iss`, in payload order.
    pub fn custom_claims(&self) -> Map<String, Value> {
        self.payload
            .iter()
            .filter(|(k, _)| !REGISTERED_CLAIMS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Derives the token id from the current headers and payload:
    /// `md5_hex(base64(json([payload, headers])) + secret)`.
    pub fn derive_id(&self, secret: &str) -> String {
        let pair = Value::Array(vec![
            Value::Object(self.payload.clone()),
            Value::Object(self.headers.clone()),
        ]);
        let encoded = codec::base64_standard(pair.to_string().as_bytes());
        md5_hex(format!("{encoded}{secret}"))
    }

    /// Sets `jti` from [`Token::derive_id`] unless one is already present.
    pub fn ensure_id(&mut self, secret: &str) -> &str {
        if self.id().is_none() {
            let jti = self.derive_id(secret);
            self.headers.insert("jti".to_string(), Value::from(jti));
        }
        self.id().unwrap_or_default()
    }

    /// The first two encoded segments joined by `.`.
    pub fn signature_string(&self) -> String {
        codec::signature_string(&self.headers, &self.payload)
    }

    /// Sets the `sce` and `alg` headers, derives `jti` if absent, signs with
    /// the scene's default signer and returns the three-segment string.
    pub fn encode(&mut self, keys: &SceneKeys) -> crate::AuthResult<String> {
        let signer = keys.default_signer();
        self.scene = keys.name().to_string();
        self.set_header("sce", keys.name());
        self.set_header("alg", signer.algorithm().as_str());
        self.ensure_id(keys.secret());

        let signature_string = self.signature_string();
        let signature = signer.sign(&signature_string)?;
        Ok(format!(
            "{signature_string}.{}",
            codec::encode_segment(signature.as_bytes())
        ))
    }
}
