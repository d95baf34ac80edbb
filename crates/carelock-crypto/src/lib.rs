pub mod envelope;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod types;

pub use envelope::FieldCipher;
pub use error::CryptoError;
pub use kdf::{derive_key, DEFAULT_PBKDF2_ITERATIONS};
pub use keys::{DerivedKey, MasterKey};
pub use types::{
    IV_LENGTH, KEY_LENGTH, MIN_ENVELOPE_LENGTH, MIN_MASTER_KEY_LENGTH, SALT_LENGTH, TAG_LENGTH,
};
