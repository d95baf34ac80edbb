//! PHI protection and access control.
//!
//! Field-level envelope encryption over JSON records, a secure data-access
//! service that encrypts before write, decrypts after read, and audits every
//! access attempt, plus signed sessions and route-level access control.
//! Storage and the audit sink are external collaborators behind traits.

pub mod audit;
pub mod config;
pub mod error;
pub mod http;
pub mod redact;
pub mod service;
pub mod store;
pub mod taxonomy;
pub mod traverse;

pub use audit::{AuditEntry, AuditError, AuditLog, MemoryAuditLog};
pub use config::VaultConfig;
pub use error::VaultError;
pub use http::{AccessControl, AccessError, AuthContext, RouteClass, RoutePolicy};
pub use redact::{sanitize_text, sanitize_value, REDACTED};
pub use service::RecordVault;
pub use store::{MemoryStore, RecordStore, StoreError};
pub use taxonomy::FieldSet;
pub use traverse::{decrypt_object, encrypt_object, is_encrypted, partial_decrypt};

pub use carelock_crypto::{FieldCipher, MasterKey};
pub use carelock_session::{SessionClaims, SessionSigner, TokenError};
