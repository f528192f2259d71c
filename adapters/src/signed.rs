//! Adapter for session tokens signed by the external identity provider.
//!
//! A token is `hex(claims_json) "." hex(signature)`, where the signature is a
//! compact secp256k1 ECDSA signature over the SHA-256 digest of the claims
//! bytes. The backend only holds the issuer's public key and never mints
//! tokens itself; [`TokenIssuer`] exists for local development and tests.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use http::header::{AUTHORIZATION, COOKIE};
use http::HeaderMap;
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey, SignOnly, VerifyOnly};
use sha2::{Digest, Sha256};

use crate::errors::IdentityError;
use crate::models::{Claims, Session};
use crate::IdentityProvider;

fn digest(payload: &[u8]) -> Message {
    let hash: [u8; 32] = Sha256::digest(payload).into();
    Message::from_digest(hash)
}

pub struct SignedTokenProvider {
    secp: Secp256k1<VerifyOnly>,
    issuer: PublicKey,
    cookie_name: String,
}

impl SignedTokenProvider {
    pub fn new(issuer: PublicKey, cookie_name: impl Into<String>) -> Self {
        Self {
            secp: Secp256k1::verification_only(),
            issuer,
            cookie_name: cookie_name.into(),
        }
    }

    /// Builds a provider from the issuer's hex-encoded compressed public key.
    pub fn from_hex(issuer_hex: &str, cookie_name: impl Into<String>) -> Result<Self, IdentityError> {
        let issuer = PublicKey::from_str(issuer_hex.trim())
            .map_err(|e| IdentityError::InvalidKey(e.to_string()))?;
        Ok(Self::new(issuer, cookie_name))
    }

    /// Verifies `token` and checks expiry against `now` (unix seconds).
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, IdentityError> {
        let (payload_hex, signature_hex) = token
            .trim()
            .split_once('.')
            .ok_or_else(|| IdentityError::MalformedToken("missing signature".to_string()))?;

        let payload = hex::decode(payload_hex)
            .map_err(|e| IdentityError::MalformedToken(e.to_string()))?;
        let signature_bytes = hex::decode(signature_hex)
            .map_err(|e| IdentityError::MalformedToken(e.to_string()))?;
        let signature = Signature::from_compact(&signature_bytes)
            .map_err(|e| IdentityError::MalformedToken(e.to_string()))?;

        self.secp
            .verify_ecdsa(&digest(&payload), &signature, &self.issuer)
            .map_err(|_| IdentityError::InvalidSignature)?;

        let claims: Claims = serde_json::from_slice(&payload)
            .map_err(|e| IdentityError::MalformedToken(e.to_string()))?;

        if claims.exp <= now {
            return Err(IdentityError::Expired(claims.exp));
        }

        Ok(claims)
    }

    fn token_from_headers<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        let bearer = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));
        if bearer.is_some() {
            return bearer;
        }

        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value)
    }
}

#[async_trait]
impl IdentityProvider for SignedTokenProvider {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Session, IdentityError> {
        let Some(token) = self.token_from_headers(headers) else {
            return Ok(Session::anonymous());
        };

        let claims = self.verify_at(token, Utc::now().timestamp())?;
        log::trace!("verified session token for {}", claims.sub);
        claims.into_session()
    }

    fn name(&self) -> &'static str {
        "signed-token"
    }
}

/// Mints tokens the way the identity provider does.
pub struct TokenIssuer {
    secp: Secp256k1<SignOnly>,
    key: SecretKey,
}

impl TokenIssuer {
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, IdentityError> {
        let bytes = hex::decode(secret_hex.trim())
            .map_err(|e| IdentityError::InvalidKey(e.to_string()))?;
        let key =
            SecretKey::from_slice(&bytes).map_err(|e| IdentityError::InvalidKey(e.to_string()))?;
        Ok(Self {
            secp: Secp256k1::signing_only(),
            key,
        })
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_secret_key(&self.secp, &self.key)
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key().serialize())
    }

    pub fn issue(&self, claims: &Claims) -> String {
        let payload = serde_json::to_vec(claims).unwrap_or_default();
        let signature = self.secp.sign_ecdsa(&digest(&payload), &self.key);
        format!(
            "{}.{}",
            hex::encode(&payload),
            hex::encode(signature.serialize_compact())
        )
    }
}
