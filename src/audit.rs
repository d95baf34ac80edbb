//! Audit sink seam.
//!
//! The audit trail is owned by an external collaborator; this module
//! defines the call surface and an in-memory implementation for tests.
//! Every access attempt — success or failure — produces exactly one entry,
//! and each call is awaited before the triggering operation reports
//! success. Audit failures are fail-closed: the service surfaces them
//! instead of reporting the PHI operation as successful.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Audit sink failure. Must never be silently swallowed.
#[derive(Debug, Error)]
#[error("audit sink error: {0}")]
pub struct AuditError(pub String);

/// One append-only audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub actor_id: String,
    pub subject_id: String,
    pub action: String,
    pub source_ip: String,
    pub success: bool,
    pub metadata: Value,
    /// RFC 3339.
    pub timestamp: String,
}

/// External audit collaborator.
///
/// The PHI encryption/decryption events are provided in terms of
/// `log_patient_access` with fixed action names, so a sink only has to
/// implement the two primitive calls.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Record an access attempt against a patient subject.
    async fn log_patient_access(
        &self,
        actor_id: &str,
        subject_id: &str,
        action: &str,
        source_ip: &str,
        success: bool,
        metadata: Value,
    ) -> Result<(), AuditError>;

    /// Record a non-subject-specific event (e.g. a search).
    async fn log_audit(
        &self,
        actor_id: &str,
        subject_label: &str,
        action: &str,
        source_ip: &str,
        success: bool,
        metadata: Value,
    ) -> Result<(), AuditError>;

    async fn log_phi_encryption(
        &self,
        actor_id: &str,
        subject_id: &str,
        source_ip: &str,
    ) -> Result<(), AuditError> {
        self.log_patient_access(
            actor_id,
            subject_id,
            "phi_encryption",
            source_ip,
            true,
            Value::Null,
        )
        .await
    }

    async fn log_phi_decryption(
        &self,
        actor_id: &str,
        subject_id: &str,
        source_ip: &str,
    ) -> Result<(), AuditError> {
        self.log_patient_access(
            actor_id,
            subject_id,
            "phi_decryption",
            source_ip,
            true,
            Value::Null,
        )
        .await
    }
}

/// In-memory audit sink for tests and local development.
#[derive(Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries, in append order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }

    /// Entries whose action matches, in append order.
    pub fn entries_for_action(&self, action: &str) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }

    fn push(&self, entry: AuditEntry) {
        self.entries.lock().push(entry);
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn log_patient_access(
        &self,
        actor_id: &str,
        subject_id: &str,
        action: &str,
        source_ip: &str,
        success: bool,
        metadata: Value,
    ) -> Result<(), AuditError> {
        self.push(AuditEntry {
            actor_id: actor_id.to_string(),
            subject_id: subject_id.to_string(),
            action: action.to_string(),
            source_ip: source_ip.to_string(),
            success,
            metadata,
            timestamp: chrono::Utc::now().to_rfc3339(),
        });
        Ok(())
    }

    async fn log_audit(
        &self,
        actor_id: &str,
        subject_label: &str,
        action: &str,
        source_ip: &str,
        success: bool,
        metadata: Value,
    ) -> Result<(), AuditError> {
        self.push(AuditEntry {
            actor_id: actor_id.to_string(),
            subject_id: subject_label.to_string(),
            action: action.to_string(),
            source_ip: source_ip.to_string(),
            success,
            metadata,
            timestamp: chrono::Utc::now().to_rfc3339(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn records_access_attempts() {
        let log = MemoryAuditLog::new();
        log.log_patient_access("dr-1", "pt-9", "record_access", "10.0.0.1", true, json!({}))
            .await
            .unwrap();
        log.log_patient_access("dr-1", "pt-9", "record_access", "10.0.0.1", false, json!({}))
            .await
            .unwrap();

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].success);
        assert!(!entries[1].success);
    }

    #[tokio::test]
    async fn phi_events_use_fixed_action_names() {
        let log = MemoryAuditLog::new();
        log.log_phi_encryption("dr-1", "pt-9", "10.0.0.1").await.unwrap();
        log.log_phi_decryption("dr-1", "pt-9", "10.0.0.1").await.unwrap();

        assert_eq!(log.entries_for_action("phi_encryption").len(), 1);
        assert_eq!(log.entries_for_action("phi_decryption").len(), 1);
    }
}
