pub mod error;
pub mod token;

pub use error::TokenError;
pub use token::{SessionClaims, SessionSigner, DEFAULT_SESSION_LIFETIME_MS, MIN_SECRET_LENGTH};
