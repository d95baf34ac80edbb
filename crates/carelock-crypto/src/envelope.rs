//! AES-256-GCM field envelope encryption.
//!
//! Persisted wire format (bit-exact, shared with external readers):
//! `base64( salt[32] ‖ iv[16] ‖ authTag[16] ‖ ciphertext[N] )`
//!
//! Salt and IV are random per encryption, so encrypting the same plaintext
//! twice yields different blobs. The per-value key is stretched from the
//! master key with PBKDF2-HMAC-SHA256 using the embedded salt.

use aes_gcm::aead::generic_array::typenum::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::AesGcm;
use base64ct::{Base64, Encoding};

use crate::error::CryptoError;
use crate::kdf::{derive_key, DEFAULT_PBKDF2_ITERATIONS};
use crate::keys::MasterKey;
use crate::types::{IV_LENGTH, MIN_ENVELOPE_LENGTH, SALT_LENGTH, TAG_LENGTH};

/// AES-256-GCM parameterized with the envelope contract's 16-byte IV.
type EnvelopeAead = AesGcm<Aes256, U16>;

/// Field-level envelope cipher.
///
/// Holds the process-wide master key and the PBKDF2 iteration count; both
/// are read-only for the cipher's lifetime. Each encrypt/decrypt call
/// derives its own ephemeral key from a per-value salt.
pub struct FieldCipher {
    master: MasterKey,
    iterations: u32,
}

impl FieldCipher {
    /// Create a cipher with the default iteration count (100,000).
    pub fn new(master: MasterKey) -> Self {
        Self {
            master,
            iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }

    /// Create a cipher with an explicit iteration count. Counts below 1,000
    /// are rejected; external readers must use the same count to interoperate.
    pub fn with_iterations(master: MasterKey, iterations: u32) -> Result<Self, CryptoError> {
        if iterations < 1_000 {
            return Err(CryptoError::InvalidIterationCount(iterations));
        }
        Ok(Self { master, iterations })
    }

    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Encrypt a single value into an opaque envelope.
    ///
    /// Empty input maps to `Ok(None)`; there is no envelope for "nothing".
    /// Output is non-deterministic: two calls on identical input produce
    /// different blobs.
    pub fn encrypt_value(&self, plaintext: &str) -> Result<Option<String>, CryptoError> {
        if plaintext.is_empty() {
            return Ok(None);
        }

        let salt = random_bytes::<SALT_LENGTH>()?;
        let iv = random_bytes::<IV_LENGTH>()?;

        let key = derive_key(&self.master, &salt, self.iterations);
        let cipher = EnvelopeAead::new_from_slice(key.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        // AEAD output is ciphertext ‖ tag; the envelope stores tag first.
        let sealed = cipher
            .encrypt(GenericArray::from_slice(&iv), plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LENGTH);

        let mut raw = Vec::with_capacity(SALT_LENGTH + IV_LENGTH + TAG_LENGTH + ciphertext.len());
        raw.extend_from_slice(&salt);
        raw.extend_from_slice(&iv);
        raw.extend_from_slice(tag);
        raw.extend_from_slice(ciphertext);

        Ok(Some(Base64::encode_string(&raw)))
    }

    /// Decrypt an envelope, failing closed.
    ///
    /// Any failure — malformed base64, truncated envelope, flipped bit
    /// anywhere in salt/IV/tag/ciphertext, wrong master key — returns `None`.
    /// Partially decrypted bytes are never returned and the cause is only
    /// logged server-side.
    pub fn decrypt_value(&self, blob: &str) -> Option<String> {
        if blob.is_empty() {
            return None;
        }
        match self.try_decrypt_value(blob) {
            Ok(plaintext) => Some(plaintext),
            Err(err) => {
                tracing::warn!(error = %err, "envelope decryption failed");
                None
            }
        }
    }

    /// Decrypt an envelope, surfacing the failure cause to the caller.
    /// Service layers that need the error for their own taxonomy use this;
    /// everything else goes through [`decrypt_value`](Self::decrypt_value).
    pub fn try_decrypt_value(&self, blob: &str) -> Result<String, CryptoError> {
        let raw = Base64::decode_vec(blob).map_err(|_| CryptoError::InvalidBase64)?;
        if raw.len() < MIN_ENVELOPE_LENGTH {
            return Err(CryptoError::EnvelopeTooShort);
        }

        let (salt, rest) = raw.split_at(SALT_LENGTH);
        let (iv, rest) = rest.split_at(IV_LENGTH);
        let (tag, ciphertext) = rest.split_at(TAG_LENGTH);

        let key = derive_key(&self.master, salt, self.iterations);
        let cipher = EnvelopeAead::new_from_slice(key.as_bytes())
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

        // Reassemble ciphertext ‖ tag for the AEAD decrypt-and-verify.
        let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LENGTH);
        sealed.extend_from_slice(ciphertext);
        sealed.extend_from_slice(tag);

        let plaintext = cipher
            .decrypt(GenericArray::from_slice(iv), sealed.as_slice())
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8)
    }
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher")
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}

/// Fill a fixed-size buffer from the OS RNG.
fn random_bytes<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1,000 iterations keep tests fast; the format is identical.
    fn cipher() -> FieldCipher {
        let master = MasterKey::new(vec![0x42; 32]).unwrap();
        FieldCipher::with_iterations(master, 1_000).unwrap()
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let fc = cipher();
        let blob = fc.encrypt_value("123-45-6789").unwrap().unwrap();
        assert_eq!(fc.decrypt_value(&blob).unwrap(), "123-45-6789");
    }

    #[test]
    fn round_trip_unicode() {
        let fc = cipher();
        let blob = fc.encrypt_value("Müller — 患者").unwrap().unwrap();
        assert_eq!(fc.decrypt_value(&blob).unwrap(), "Müller — 患者");
    }

    #[test]
    fn empty_input_maps_to_none_both_ways() {
        let fc = cipher();
        assert!(fc.encrypt_value("").unwrap().is_none());
        assert!(fc.decrypt_value("").is_none());
    }

    #[test]
    fn different_blob_each_time() {
        let fc = cipher();
        let a = fc.encrypt_value("same plaintext").unwrap().unwrap();
        let b = fc.encrypt_value("same plaintext").unwrap().unwrap();
        assert_ne!(a, b);
        assert_eq!(fc.decrypt_value(&a).unwrap(), "same plaintext");
        assert_eq!(fc.decrypt_value(&b).unwrap(), "same plaintext");
    }

    #[test]
    fn envelope_layout_lengths() {
        let fc = cipher();
        let blob = fc.encrypt_value("x").unwrap().unwrap();
        let raw = Base64::decode_vec(&blob).unwrap();
        // salt + iv + tag + 1 byte of ciphertext
        assert_eq!(raw.len(), SALT_LENGTH + IV_LENGTH + TAG_LENGTH + 1);
        assert!(raw.len() > MIN_ENVELOPE_LENGTH);
    }

    #[test]
    fn flipping_any_byte_fails_closed() {
        let fc = cipher();
        let blob = fc.encrypt_value("tamper target").unwrap().unwrap();
        let raw = Base64::decode_vec(&blob).unwrap();

        for i in 0..raw.len() {
            let mut mutated = raw.clone();
            mutated[i] ^= 0x01;
            let tampered = Base64::encode_string(&mutated);
            assert!(
                fc.decrypt_value(&tampered).is_none(),
                "byte {i} flip was not detected"
            );
        }
    }

    #[test]
    fn wrong_master_key_fails_closed() {
        let fc = cipher();
        let other = FieldCipher::with_iterations(MasterKey::new(vec![0x43; 32]).unwrap(), 1_000)
            .unwrap();
        let blob = fc.encrypt_value("secret").unwrap().unwrap();
        assert!(other.decrypt_value(&blob).is_none());
    }

    #[test]
    fn wrong_iteration_count_fails_closed() {
        let master = MasterKey::new(vec![0x42; 32]).unwrap();
        let fc = cipher();
        let other = FieldCipher::with_iterations(master, 2_000).unwrap();
        let blob = fc.encrypt_value("secret").unwrap().unwrap();
        assert!(other.decrypt_value(&blob).is_none());
    }

    #[test]
    fn malformed_inputs_fail_closed() {
        let fc = cipher();
        assert!(fc.decrypt_value("not base64 !!!").is_none());
        assert!(fc.decrypt_value(&Base64::encode_string(&[0u8; 10])).is_none());
        assert!(fc.decrypt_value("AAAA").is_none());
    }

    #[test]
    fn try_decrypt_reports_cause() {
        let fc = cipher();
        let err = fc.try_decrypt_value("%%%").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidBase64));

        let short = Base64::encode_string(&[0u8; 20]);
        let err = fc.try_decrypt_value(&short).unwrap_err();
        assert!(matches!(err, CryptoError::EnvelopeTooShort));
    }

    #[test]
    fn rejects_low_iteration_count() {
        let master = MasterKey::new(vec![0x42; 32]).unwrap();
        assert!(FieldCipher::with_iterations(master, 10).is_err());
    }

    #[test]
    fn debug_does_not_leak_master_key() {
        let fc = cipher();
        let debug_output = format!("{fc:?}");
        assert!(!debug_output.contains("66"));
        assert!(debug_output.contains("iterations"));
    }
}
