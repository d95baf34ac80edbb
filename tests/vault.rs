//! End-to-end vault scenarios: encrypt-before-write, decrypt-after-read,
//! audit trail shape, and the fail-closed audit policy.

use async_trait::async_trait;
use serde_json::{json, Value};

use carelock::{
    sanitize_text, AuditError, AuditLog, MemoryAuditLog, MemoryStore, RecordStore, RecordVault,
    StoreError, VaultConfig, VaultError, REDACTED,
};

fn config() -> VaultConfig {
    VaultConfig::new(vec![0x11; 32], vec![0x22; 32])
        .unwrap()
        .with_pbkdf2_iterations(1_000)
}

fn vault() -> RecordVault<MemoryStore, MemoryAuditLog> {
    RecordVault::new(&config(), MemoryStore::new(), MemoryAuditLog::new()).unwrap()
}

// ============================================================================
// Core scenario
// ============================================================================

#[tokio::test]
async fn jane_scenario() {
    let v = vault();
    let created = v
        .create_record(
            json!({"firstName": "Jane", "ssn": "123-45-6789", "mrn": "PT-2025-001"}),
            "dr-1",
            "10.0.0.1",
        )
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    // Persisted ssn is an envelope, longer than 64 raw bytes pre-base64
    let stored = v.store().get(id).await.unwrap().unwrap();
    let blob = stored["ssn"].as_str().unwrap();
    assert_ne!(blob, "123-45-6789");
    assert!(blob.len() * 3 / 4 > 64);

    // Read returns the plaintext
    let fetched = v.get_record(id, "dr-1", "10.0.0.1").await.unwrap().unwrap();
    assert_eq!(fetched["ssn"], json!("123-45-6789"));
    assert_eq!(fetched["firstName"], json!("Jane"));

    // The same value never reaches a log verbatim
    assert_eq!(sanitize_text("123-45-6789"), REDACTED);
}

#[tokio::test]
async fn search_returns_identifiers_only() {
    let v = vault();
    v.create_record(
        json!({"mrn": "PT-2025-001", "firstName": "Jane", "diagnosis": "T2DM"}),
        "dr-1",
        "10.0.0.1",
    )
    .await
    .unwrap();

    let results = v.search_records("PT-2025", "dr-1", "10.0.0.1").await.unwrap();
    assert_eq!(results.len(), 1);
    let hit = results[0].as_object().unwrap();
    assert!(hit.contains_key("mrn"));
    assert!(!hit.contains_key("firstName"));
    assert!(!hit.contains_key("diagnosis"));
}

#[tokio::test]
async fn full_audit_trail_per_lifecycle() {
    let v = vault();
    let created = v
        .create_record(json!({"firstName": "Jane"}), "dr-1", "10.0.0.1")
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    v.get_record(id, "dr-1", "10.0.0.1").await.unwrap();
    v.update_record(id, json!({"firstName": "Janet"}), "dr-1", "10.0.0.1")
        .await
        .unwrap();
    v.search_records("x", "dr-1", "10.0.0.1").await.unwrap();
    v.delete_record(id, "dr-1", "10.0.0.1").await.unwrap();

    let actions: Vec<String> = v.audit().entries().iter().map(|e| e.action.clone()).collect();
    assert_eq!(
        actions,
        vec![
            "phi_encryption",
            "record_create",
            "phi_decryption",
            "record_access",
            "phi_encryption",
            "record_update",
            "record_search",
            "record_delete",
        ]
    );
}

// ============================================================================
// Failing collaborators
// ============================================================================

/// Audit sink that always fails.
struct BrokenAuditLog;

#[async_trait]
impl AuditLog for BrokenAuditLog {
    async fn log_patient_access(
        &self,
        _: &str,
        _: &str,
        _: &str,
        _: &str,
        _: bool,
        _: Value,
    ) -> Result<(), AuditError> {
        Err(AuditError("sink unreachable".to_string()))
    }

    async fn log_audit(
        &self,
        _: &str,
        _: &str,
        _: &str,
        _: &str,
        _: bool,
        _: Value,
    ) -> Result<(), AuditError> {
        Err(AuditError("sink unreachable".to_string()))
    }
}

/// Store that always fails.
struct BrokenStore;

#[async_trait]
impl RecordStore for BrokenStore {
    async fn put(&self, _: &str, _: Value) -> Result<(), StoreError> {
        Err(StoreError("disk on fire".to_string()))
    }
    async fn get(&self, _: &str) -> Result<Option<Value>, StoreError> {
        Err(StoreError("disk on fire".to_string()))
    }
    async fn delete(&self, _: &str) -> Result<bool, StoreError> {
        Err(StoreError("disk on fire".to_string()))
    }
    async fn list(&self) -> Result<Vec<Value>, StoreError> {
        Err(StoreError("disk on fire".to_string()))
    }
}

#[tokio::test]
async fn audit_failure_fails_the_operation_closed() {
    let v = RecordVault::new(&config(), MemoryStore::new(), BrokenAuditLog).unwrap();
    let err = v
        .create_record(json!({"firstName": "Jane"}), "dr-1", "10.0.0.1")
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::AuditSink));
}

#[tokio::test]
async fn storage_failure_surfaces_generic_error_and_audits() {
    let v = RecordVault::new(&config(), BrokenStore, MemoryAuditLog::new()).unwrap();
    let err = v
        .create_record(json!({"firstName": "Jane"}), "dr-1", "10.0.0.1")
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::Storage));
    // No internal detail in the caller-visible message
    assert!(!err.to_string().contains("disk on fire"));

    let creates = v.audit().entries_for_action("record_create");
    assert_eq!(creates.len(), 1);
    assert!(!creates[0].success);
}

#[tokio::test]
async fn storage_failure_on_reads_still_leaves_an_audit_trail() {
    let v = RecordVault::new(&config(), BrokenStore, MemoryAuditLog::new()).unwrap();

    let err = v.get_record("r1", "dr-1", "10.0.0.1").await.unwrap_err();
    assert!(matches!(err, VaultError::Storage));
    let err = v
        .update_record("r1", json!({"firstName": "X"}), "dr-1", "10.0.0.1")
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::Storage));
    let err = v.search_records("PT", "dr-1", "10.0.0.1").await.unwrap_err();
    assert!(matches!(err, VaultError::Storage));
    let err = v.delete_record("r1", "dr-1", "10.0.0.1").await.unwrap_err();
    assert!(matches!(err, VaultError::Storage));

    // One failed entry per attempt, none silently dropped
    let entries = v.audit().entries();
    assert_eq!(entries.len(), 4);
    assert!(entries.iter().all(|e| !e.success));
    assert!(entries
        .iter()
        .all(|e| e.metadata["reason"] == json!("storage_error")));
    let actions: Vec<String> = entries.iter().map(|e| e.action.clone()).collect();
    assert_eq!(
        actions,
        vec![
            "record_access",
            "record_update",
            "record_search",
            "record_delete",
        ]
    );
}

// ============================================================================
// Configuration refusal
// ============================================================================

#[test]
fn refuses_to_start_without_real_key_material() {
    assert!(matches!(
        VaultConfig::new(Vec::new(), vec![0x22; 32]),
        Err(VaultError::Configuration(_))
    ));
    assert!(matches!(
        VaultConfig::new(b"short".to_vec(), vec![0x22; 32]),
        Err(VaultError::Configuration(_))
    ));
}
