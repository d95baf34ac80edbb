//! Service-level error taxonomy.
//!
//! Crypto, storage, and audit failures are caught at the service boundary
//! and re-raised as this small set. The `Display` strings are what callers
//! may surface; internal detail (backend messages, stack context) is logged
//! server-side only, after redaction.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    /// Missing or unusable key material / secrets. Encryption must refuse
    /// to start rather than substitute a guessable default.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A crypto primitive failed during encryption. Opaque to callers.
    #[error("encryption operation failed")]
    Encryption,

    /// An envelope failed to decrypt in a context where the whole operation
    /// depends on it. Per-field failures inside a record read do not raise
    /// this; they null the field instead.
    #[error("decryption operation failed")]
    Decryption,

    /// Record payload was not a JSON object.
    #[error("record payload must be a JSON object")]
    InvalidPayload,

    /// Referenced record does not exist.
    #[error("record not found")]
    NotFound,

    /// The datastore collaborator failed. Generic by design.
    #[error("record storage operation failed")]
    Storage,

    /// The audit sink failed. Audit writes are fail-closed: the operation
    /// that triggered them does not report success.
    #[error("audit sink unavailable")]
    AuditSink,

    /// Authenticated but not entitled to the resource.
    #[error("not authorized")]
    AuthorizationDenied,

    #[error(transparent)]
    Token(#[from] carelock_session::TokenError),
}

impl From<carelock_crypto::CryptoError> for VaultError {
    fn from(err: carelock_crypto::CryptoError) -> Self {
        use carelock_crypto::CryptoError;
        match err {
            CryptoError::MasterKeyTooShort { .. } | CryptoError::InvalidIterationCount(_) => {
                VaultError::Configuration(err.to_string())
            }
            CryptoError::EncryptionFailed(_) | CryptoError::RngFailed(_) => VaultError::Encryption,
            _ => VaultError::Decryption,
        }
    }
}
