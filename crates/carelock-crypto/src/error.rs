use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid master key: expected at least {expected} bytes, got {got}")]
    MasterKeyTooShort { expected: usize, got: usize },

    #[error("Invalid PBKDF2 iteration count: {0}")]
    InvalidIterationCount(u32),

    #[error("Encrypted envelope too short")]
    EnvelopeTooShort,

    #[error("Envelope is not valid base64")]
    InvalidBase64,

    #[error("Decrypted bytes are not valid UTF-8")]
    InvalidUtf8,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}
