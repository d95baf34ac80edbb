//! Key material types.
//!
//! Both key types implement `Zeroize` and `ZeroizeOnDrop` so secret bytes
//! are erased when no longer needed, and neither exposes key bytes through
//! `Debug`.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;
use crate::types::{KEY_LENGTH, MIN_MASTER_KEY_LENGTH};

/// Process-wide master secret. Never used directly as an encryption key;
/// only as PBKDF2 input keying material.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: Vec<u8>,
}

impl MasterKey {
    /// Construct a master key, rejecting material shorter than
    /// [`MIN_MASTER_KEY_LENGTH`]. There is no fallback key: callers that
    /// cannot supply real key material must not start encryption at all.
    pub fn new(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() < MIN_MASTER_KEY_LENGTH {
            return Err(CryptoError::MasterKeyTooShort {
                expected: MIN_MASTER_KEY_LENGTH,
                got: bytes.len(),
            });
        }
        Ok(Self { bytes })
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

/// Ephemeral 32-byte key stretched from the master key for one
/// encrypt/decrypt call. Dropped (and zeroized) as soon as the call ends.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LENGTH],
}

impl DerivedKey {
    pub(crate) fn new(bytes: [u8; KEY_LENGTH]) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_master_key() {
        let err = MasterKey::new(vec![0u8; 16]).unwrap_err();
        assert!(err.to_string().contains("at least 32 bytes"));
    }

    #[test]
    fn accepts_32_byte_master_key() {
        let key = MasterKey::new(vec![7u8; 32]).unwrap();
        assert_eq!(key.as_bytes().len(), 32);
    }

    #[test]
    fn debug_does_not_leak_key_bytes() {
        let key = MasterKey::new(vec![0xAB; 32]).unwrap();
        let debug_output = format!("{key:?}");
        assert!(!debug_output.contains("171"));
        assert!(!debug_output.to_lowercase().contains("ab, ab"));
        assert!(debug_output.contains("size_bytes"));
    }

    #[test]
    fn derived_key_debug_is_opaque() {
        let key = DerivedKey::new([0x42; 32]);
        let debug_output = format!("{key:?}");
        assert!(!debug_output.contains("66"));
    }
}
