//! HMAC-signed JSON Web Tokens.
//!
//! Image URLs carry a compact JWS as their first path segment:
//!
//! ```text
//! /eyJhbGciOiJIUzI1NiJ9.eyJ0aXRsZSI6IkhlbGxvIn0.3q2-7w...
//!   base64url(header)   . base64url(payload)    . base64url(HMAC)
//! ```
//!
//! The signature is `HMAC-SHA{256,384,512}(secret, "{header}.{payload}")`,
//! selected by the header's `alg`. Verification checks, in order: structure,
//! algorithm, `crit`, signature (constant-time), then the registered time
//! claims `exp`, `nbf` and `iat`.
//!
//! # Example
//!
//! ```rust
//! use og_image_server::token::{Claims, TokenAuth};
//! use std::time::Duration;
//!
//! let auth = TokenAuth::new("my-secret-key");
//! let token = auth.sign(&Claims::new("Hello"), Some(Duration::from_secs(3600)));
//!
//! let payload = auth.verify(&token).unwrap();
//! assert_eq!(payload["title"], "Hello");
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use serde_json::{json, Map, Value};
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use super::Claims;
use crate::error::TokenError;

// =============================================================================
// Algorithms
// =============================================================================

/// Supported JWS signing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Hs256,
    Hs384,
    Hs512,
}

impl Algorithm {
    /// Parse the `alg` header value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "HS256" => Some(Algorithm::Hs256),
            "HS384" => Some(Algorithm::Hs384),
            "HS512" => Some(Algorithm::Hs512),
            _ => None,
        }
    }

    /// The `alg` header value.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Hs256 => "HS256",
            Algorithm::Hs384 => "HS384",
            Algorithm::Hs512 => "HS512",
        }
    }
}

// =============================================================================
// Token Authentication
// =============================================================================

/// Verifies and issues image tokens with a pre-shared secret.
#[derive(Clone)]
pub struct TokenAuth {
    /// Secret key for HMAC computation
    secret_key: Vec<u8>,

    /// Clock tolerance applied to `exp` and `nbf`
    leeway: Duration,
}

impl TokenAuth {
    /// Create an authenticator with the given secret and no clock tolerance.
    pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
        Self {
            secret_key: secret_key.as_ref().to_vec(),
            leeway: Duration::ZERO,
        }
    }

    /// Set the clock tolerance for `exp` and `nbf`.
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Verify a token against the current time and return its payload.
    pub fn verify(&self, token: &str) -> Result<Map<String, Value>, TokenError> {
        self.verify_at(token, current_time())
    }

    /// Verify a token as of `now` (Unix epoch seconds).
    pub fn verify_at(&self, token: &str, now: u64) -> Result<Map<String, Value>, TokenError> {
        if token.is_empty() {
            return Err(TokenError::Missing);
        }

        let segments: Vec<&str> = token.split('.').collect();
        let [header_b64, payload_b64, signature_b64] = segments[..] else {
            return Err(TokenError::Malformed(format!(
                "expected 3 segments, got {}",
                segments.len()
            )));
        };

        let header = decode_object(header_b64, "header")?;
        let alg_name = header
            .get("alg")
            .and_then(Value::as_str)
            .ok_or_else(|| TokenError::Malformed("header has no alg".to_string()))?;
        let alg = Algorithm::from_name(alg_name)
            .ok_or_else(|| TokenError::UnsupportedAlgorithm(alg_name.to_string()))?;

        if header.contains_key("crit") {
            return Err(TokenError::CriticalHeader);
        }

        let provided_sig = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::Malformed("signature is not base64url".to_string()))?;

        let signing_input = &token[..header_b64.len() + 1 + payload_b64.len()];
        let expected_sig = self.compute_signature(alg, signing_input.as_bytes());

        if !bool::from(provided_sig.ct_eq(&expected_sig)) {
            return Err(TokenError::InvalidSignature);
        }

        let payload = decode_object(payload_b64, "payload")?;
        self.check_time_claims(&payload, now)?;

        Ok(payload)
    }

    /// Issue an HS256 token for `claims`.
    ///
    /// The payload also carries `iat`, and `exp` when `ttl` is given.
    pub fn sign(&self, claims: &Claims, ttl: Option<Duration>) -> String {
        let now = current_time();
        let mut payload = Map::new();
        payload.insert("title".to_string(), Value::from(claims.title.as_str()));
        if let Some(description) = &claims.description {
            payload.insert("description".to_string(), Value::from(description.as_str()));
        }
        payload.insert("iat".to_string(), Value::from(now));
        if let Some(ttl) = ttl {
            payload.insert("exp".to_string(), Value::from(now + ttl.as_secs()));
        }

        self.sign_payload(&payload, Algorithm::Hs256)
    }

    /// Issue a token for an arbitrary JSON payload.
    pub fn sign_payload(&self, payload: &Map<String, Value>, alg: Algorithm) -> String {
        let header = json!({ "alg": alg.name(), "typ": "JWT" });
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(Value::Object(payload.clone()).to_string())
        );
        let signature = self.compute_signature(alg, signing_input.as_bytes());

        format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature))
    }

    fn compute_signature(&self, alg: Algorithm, message: &[u8]) -> Vec<u8> {
        match alg {
            Algorithm::Hs256 => hmac_digest::<Hmac<Sha256>>(&self.secret_key, message),
            Algorithm::Hs384 => hmac_digest::<Hmac<Sha384>>(&self.secret_key, message),
            Algorithm::Hs512 => hmac_digest::<Hmac<Sha512>>(&self.secret_key, message),
        }
    }

    fn check_time_claims(&self, payload: &Map<String, Value>, now: u64) -> Result<(), TokenError> {
        let leeway = self.leeway.as_secs_f64();

        numeric_claim(payload, "iat")?;

        if let Some(not_before) = numeric_claim(payload, "nbf")? {
            if not_before > now as f64 + leeway {
                return Err(TokenError::NotYetValid {
                    not_before,
                    current_time: now,
                });
            }
        }

        if let Some(expired_at) = numeric_claim(payload, "exp")? {
            if expired_at <= now as f64 - leeway {
                return Err(TokenError::Expired {
                    expired_at,
                    current_time: now,
                });
            }
        }

        Ok(())
    }
}

fn hmac_digest<M: Mac + KeyInit>(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = <M as Mac>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

fn decode_object(segment: &str, part: &str) -> Result<Map<String, Value>, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed(format!("{} is not base64url", part)))?;

    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(TokenError::Malformed(format!("{} is not a JSON object", part))),
    }
}

fn numeric_claim(payload: &Map<String, Value>, claim: &'static str) -> Result<Option<f64>, TokenError> {
    match payload.get(claim) {
        None => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| TokenError::InvalidClaim {
            claim,
            message: "must be a number".to_string(),
        }),
    }
}

fn current_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// =============================================================================
// Tests
// =============================================================================
