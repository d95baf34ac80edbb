use thiserror::Error;

/// Internal rejection reasons for session tokens.
///
/// Callers at the HTTP boundary collapse all of these into a uniform
/// redirect/401; the distinction exists for logging and tests only.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Session secret too short: expected at least {expected} bytes, got {got}")]
    SecretTooShort { expected: usize, got: usize },

    #[error("No session token presented")]
    Missing,

    #[error("Session token is malformed")]
    Malformed,

    #[error("Session token signature mismatch")]
    BadSignature,

    #[error("Session token expired")]
    Expired,
}
