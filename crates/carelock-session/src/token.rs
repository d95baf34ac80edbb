//! Signed session tokens.
//!
//! Wire format: `<base64 JSON payload>.<hex HMAC-SHA256 signature>`.
//! Payload fields: `subjectId`, `displayName`, `createdAt` (epoch ms),
//! `expiresAt` (epoch ms). Tokens are immutable once issued: validity ends
//! purely by clock expiry or signature mismatch, and extension mints a new
//! token rather than mutating the old one.

use base64ct::{Base64, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::TokenError;

type HmacSha256 = Hmac<Sha256>;

/// Default token lifetime: 12 hours.
pub const DEFAULT_SESSION_LIFETIME_MS: i64 = 12 * 60 * 60 * 1000;

/// Minimum HMAC secret length in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Decoded token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub subject_id: String,
    pub display_name: String,
    /// Issue time, epoch milliseconds.
    pub created_at: i64,
    /// Expiry, epoch milliseconds. Fixed at creation.
    pub expires_at: i64,
}

/// Issues and verifies stateless session tokens.
///
/// Holds only the HMAC secret and the fixed lifetime; there is no
/// server-side token store. A leaked, non-expired token stays valid until
/// natural expiry.
pub struct SessionSigner {
    mac: HmacSha256,
    lifetime_ms: i64,
}

impl SessionSigner {
    /// Create a signer with the default 12-hour lifetime. Secrets shorter
    /// than [`MIN_SECRET_LENGTH`] are refused; there is no default secret.
    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        Self::with_lifetime(secret, DEFAULT_SESSION_LIFETIME_MS)
    }

    /// Create a signer with an explicit lifetime in milliseconds.
    pub fn with_lifetime(secret: &[u8], lifetime_ms: i64) -> Result<Self, TokenError> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(TokenError::SecretTooShort {
                expected: MIN_SECRET_LENGTH,
                got: secret.len(),
            });
        }
        // HMAC accepts any key length, so this cannot fail past the check above.
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| TokenError::SecretTooShort {
            expected: MIN_SECRET_LENGTH,
            got: secret.len(),
        })?;
        Ok(Self { mac, lifetime_ms })
    }

    #[must_use]
    pub fn lifetime_ms(&self) -> i64 {
        self.lifetime_ms
    }

    /// Issue a token for `subject_id` expiring `lifetime_ms` from now.
    pub fn create_token(&self, subject_id: &str, display_name: &str) -> String {
        self.create_token_at(subject_id, display_name, Utc::now().timestamp_millis())
    }

    /// Issue a token with an explicit issue time (epoch ms).
    pub fn create_token_at(&self, subject_id: &str, display_name: &str, now_ms: i64) -> String {
        let claims = SessionClaims {
            subject_id: subject_id.to_string(),
            display_name: display_name.to_string(),
            created_at: now_ms,
            expires_at: now_ms + self.lifetime_ms,
        };
        // SessionClaims serialization cannot fail: all fields are plain
        // strings and integers.
        let json = serde_json::to_vec(&claims).unwrap_or_default();
        let payload = Base64::encode_string(&json);
        let signature = hex::encode(self.sign(payload.as_bytes()));
        format!("{payload}.{signature}")
    }

    /// Verify a token against the current clock.
    pub fn verify_token(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.verify_token_at(token, Utc::now().timestamp_millis())
    }

    /// Verify a token against an explicit clock (epoch ms).
    ///
    /// The signature is checked in constant time before the payload is
    /// decoded; a tampered payload never reaches the JSON parser.
    pub fn verify_token_at(&self, token: &str, now_ms: i64) -> Result<SessionClaims, TokenError> {
        if token.is_empty() {
            return Err(TokenError::Missing);
        }

        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        if payload.is_empty() || signature.is_empty() {
            return Err(TokenError::Malformed);
        }

        let sig_bytes =
            Zeroizing::new(hex::decode(signature).map_err(|_| TokenError::Malformed)?);

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&sig_bytes)
            .map_err(|_| TokenError::BadSignature)?;

        let json = Base64::decode_vec(payload).map_err(|_| TokenError::Malformed)?;
        let claims: SessionClaims =
            serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

        if now_ms > claims.expires_at {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Mint a fresh token for the subject of a currently-valid token.
    ///
    /// The input token is left untouched and keeps its original expiry;
    /// invalid or expired tokens cannot be extended.
    pub fn extend_token(&self, token: &str) -> Result<String, TokenError> {
        self.extend_token_at(token, Utc::now().timestamp_millis())
    }

    /// Extend against an explicit clock (epoch ms).
    pub fn extend_token_at(&self, token: &str, now_ms: i64) -> Result<String, TokenError> {
        let claims = self.verify_token_at(token, now_ms)?;
        Ok(self.create_token_at(&claims.subject_id, &claims.display_name, now_ms))
    }

    fn sign(&self, payload: &[u8]) -> [u8; 32] {
        let mut mac = self.mac.clone();
        mac.update(payload);
        mac.finalize().into_bytes().into()
    }
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("lifetime_ms", &self.lifetime_ms)
            .finish_non_exhaustive()
    }
}
