//! PBKDF2-HMAC-SHA256 key derivation.
//!
//! Every envelope carries its own random salt, so each encrypted value gets
//! a fresh stretched key. Leaking one salt+blob pair never exposes the
//! master key, and brute-forcing one field's key is bounded independently
//! of how many fields share the master key.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::keys::{DerivedKey, MasterKey};
use crate::types::KEY_LENGTH;

/// Default PBKDF2 iteration count per the persisted envelope contract.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

/// Derive a 32-byte AES key from the master key and a per-value salt.
pub fn derive_key(master: &MasterKey, salt: &[u8], iterations: u32) -> DerivedKey {
    let mut okm = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(master.as_bytes(), salt, iterations, &mut okm);
    DerivedKey::new(okm)
}
