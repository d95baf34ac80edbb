/// Per-value PBKDF2 salt length in bytes.
pub const SALT_LENGTH: usize = 32;

/// AES-GCM IV length in bytes (128 bits, per the persisted envelope contract).
pub const IV_LENGTH: usize = 16;

/// AES-GCM authentication tag length in bytes (128 bits).
pub const TAG_LENGTH: usize = 16;

/// AES key length in bytes (256 bits).
pub const KEY_LENGTH: usize = 32;

/// Minimum master key length in bytes.
pub const MIN_MASTER_KEY_LENGTH: usize = 32;

/// Minimum raw envelope length: salt + IV + tag with empty ciphertext.
pub const MIN_ENVELOPE_LENGTH: usize = SALT_LENGTH + IV_LENGTH + TAG_LENGTH;
