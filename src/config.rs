//! Injected configuration.
//!
//! All secrets are supplied by application startup; nothing in this crate
//! reads the environment or falls back to a built-in key. Construction
//! fails on missing or weak material, so a misconfigured deployment refuses
//! to perform encryption instead of silently using a guessable key.

use carelock_crypto::{FieldCipher, MasterKey, DEFAULT_PBKDF2_ITERATIONS};
use carelock_session::{SessionSigner, DEFAULT_SESSION_LIFETIME_MS, MIN_SECRET_LENGTH};
use zeroize::Zeroizing;

use crate::error::VaultError;

/// Startup configuration for the vault and session layers.
pub struct VaultConfig {
    master_key: MasterKey,
    session_secret: Zeroizing<Vec<u8>>,
    pbkdf2_iterations: u32,
    session_lifetime_ms: i64,
}

impl VaultConfig {
    /// Validate externally supplied secrets. `master_key` must be at least
    /// 32 bytes and `session_secret` at least [`MIN_SECRET_LENGTH`] bytes.
    pub fn new(master_key: Vec<u8>, session_secret: Vec<u8>) -> Result<Self, VaultError> {
        let master_key =
            MasterKey::new(master_key).map_err(|e| VaultError::Configuration(e.to_string()))?;
        if session_secret.len() < MIN_SECRET_LENGTH {
            return Err(VaultError::Configuration(format!(
                "session secret too short: expected at least {MIN_SECRET_LENGTH} bytes, got {}",
                session_secret.len()
            )));
        }
        Ok(Self {
            master_key,
            session_secret: Zeroizing::new(session_secret),
            pbkdf2_iterations: DEFAULT_PBKDF2_ITERATIONS,
            session_lifetime_ms: DEFAULT_SESSION_LIFETIME_MS,
        })
    }

    /// Override the PBKDF2 iteration count. External envelope readers must
    /// use the same count to interoperate.
    pub fn with_pbkdf2_iterations(mut self, iterations: u32) -> Self {
        self.pbkdf2_iterations = iterations;
        self
    }

    /// Override the session lifetime in milliseconds.
    pub fn with_session_lifetime_ms(mut self, lifetime_ms: i64) -> Self {
        self.session_lifetime_ms = lifetime_ms;
        self
    }

    /// Build the field cipher for this configuration.
    pub fn field_cipher(&self) -> Result<FieldCipher, VaultError> {
        FieldCipher::with_iterations(self.master_key.clone(), self.pbkdf2_iterations)
            .map_err(|e| VaultError::Configuration(e.to_string()))
    }

    /// Build the session signer for this configuration.
    pub fn session_signer(&self) -> Result<SessionSigner, VaultError> {
        SessionSigner::with_lifetime(&self.session_secret, self.session_lifetime_ms)
            .map_err(|e| VaultError::Configuration(e.to_string()))
    }
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("pbkdf2_iterations", &self.pbkdf2_iterations)
            .field("session_lifetime_ms", &self.session_lifetime_ms)
            .finish_non_exhaustive()
    }
}
