//! Secure data access service.
//!
//! Every read and write of a patient/visit record goes through here:
//! encrypt before write, decrypt after read, and one audit event per access
//! attempt. Plaintext PHI exists only in-process for the duration of a
//! call; the store only ever holds envelopes.

use serde_json::{json, Map, Value};
use tracing::{debug, error, warn};
use uuid::Uuid;

use carelock_crypto::FieldCipher;

use crate::audit::AuditLog;
use crate::config::VaultConfig;
use crate::error::VaultError;
use crate::redact::sanitize_value;
use crate::store::RecordStore;
use crate::taxonomy::{FieldSet, SEARCHABLE_FIELDS};
use crate::traverse::{decrypt_object, encrypt_object};

/// CRUD-style access to encrypted records with a full audit trail.
///
/// All operations are request-scoped; the only shared state is the
/// read-only cipher, so concurrent requests need no locking here.
/// `update_record` is read-modify-write without a datastore transaction:
/// two concurrent updates to the same record can lose one writer's
/// changes (known gap).
pub struct RecordVault<S, A> {
    store: S,
    audit: A,
    cipher: FieldCipher,
    fields: FieldSet,
}

impl<S: RecordStore, A: AuditLog> RecordVault<S, A> {
    /// Build a vault over the given collaborators. Fails if the
    /// configuration cannot produce a cipher (missing/weak key material).
    pub fn new(config: &VaultConfig, store: S, audit: A) -> Result<Self, VaultError> {
        Ok(Self {
            store,
            audit,
            cipher: config.field_cipher()?,
            fields: FieldSet::standard().clone(),
        })
    }

    /// Replace the taxonomy with a custom field set.
    pub fn with_fields(mut self, fields: FieldSet) -> Self {
        self.fields = fields;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    /// Encrypt and persist a new record. Returns the stored (encrypted)
    /// record, including its generated `id` and timestamps.
    pub async fn create_record(
        &self,
        payload: Value,
        actor_id: &str,
        source_ip: &str,
    ) -> Result<Value, VaultError> {
        if !payload.is_object() {
            return Err(VaultError::InvalidPayload);
        }

        let mut encrypted = encrypt_object(&self.cipher, &payload, Some(&self.fields))?;

        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        if let Value::Object(ref mut map) = encrypted {
            map.insert("id".to_string(), Value::String(id.clone()));
            map.insert("createdAt".to_string(), Value::String(now.clone()));
            map.insert("updatedAt".to_string(), Value::String(now));
        }

        if let Err(err) = self.store.put(&id, encrypted.clone()).await {
            error!(record_id = %id, error = %err, "record persistence failed");
            self.audit_access(actor_id, &id, "record_create", source_ip, false, json!({}))
                .await?;
            return Err(VaultError::Storage);
        }

        self.audit
            .log_phi_encryption(actor_id, &id, source_ip)
            .await
            .map_err(audit_failure)?;
        self.audit_access(actor_id, &id, "record_create", source_ip, true, json!({}))
            .await?;

        debug!(record_id = %id, "record created");
        Ok(encrypted)
    }

    /// Fetch and decrypt a record. `Ok(None)` when absent; the miss is
    /// still audited as a failed access.
    pub async fn get_record(
        &self,
        id: &str,
        actor_id: &str,
        source_ip: &str,
    ) -> Result<Option<Value>, VaultError> {
        let stored = match self.store.get(id).await {
            Ok(stored) => stored,
            Err(err) => {
                error!(record_id = %id, error = %err, "record fetch failed");
                self.audit_access(
                    actor_id,
                    id,
                    "record_access",
                    source_ip,
                    false,
                    json!({"reason": "storage_error"}),
                )
                .await?;
                return Err(VaultError::Storage);
            }
        };

        let Some(stored) = stored else {
            self.audit_access(
                actor_id,
                id,
                "record_access",
                source_ip,
                false,
                json!({"reason": "not_found"}),
            )
            .await?;
            return Ok(None);
        };

        let decrypted = decrypt_object(&self.cipher, &stored, Some(&self.fields))?;

        self.audit
            .log_phi_decryption(actor_id, id, source_ip)
            .await
            .map_err(audit_failure)?;
        self.audit_access(actor_id, id, "record_access", source_ip, true, json!({}))
            .await?;

        Ok(Some(decrypted))
    }

    /// Read-modify-write: encrypt the partial update and merge it over the
    /// stored envelope. Returns the stored (encrypted) record.
    pub async fn update_record(
        &self,
        id: &str,
        partial: Value,
        actor_id: &str,
        source_ip: &str,
    ) -> Result<Value, VaultError> {
        let Value::Object(partial_map) = partial else {
            return Err(VaultError::InvalidPayload);
        };

        let existing = match self.store.get(id).await {
            Ok(Some(existing)) => existing,
            Ok(None) => {
                self.audit_access(
                    actor_id,
                    id,
                    "record_update",
                    source_ip,
                    false,
                    json!({"reason": "not_found"}),
                )
                .await?;
                return Err(VaultError::NotFound);
            }
            Err(err) => {
                error!(record_id = %id, error = %err, "record fetch failed");
                self.audit_access(
                    actor_id,
                    id,
                    "record_update",
                    source_ip,
                    false,
                    json!({"reason": "storage_error"}),
                )
                .await?;
                return Err(VaultError::Storage);
            }
        };

        let encrypted_partial = encrypt_object(
            &self.cipher,
            &Value::Object(partial_map),
            Some(&self.fields),
        )?;

        let mut merged = match existing {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if let Value::Object(updates) = encrypted_partial {
            for (key, value) in updates {
                // id and creation time are immutable
                if key == "id" || key == "createdAt" {
                    continue;
                }
                merged.insert(key, value);
            }
        }
        merged.insert(
            "updatedAt".to_string(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );
        let merged = Value::Object(merged);

        if let Err(err) = self.store.put(id, merged.clone()).await {
            error!(record_id = %id, error = %err, "record persistence failed");
            self.audit_access(actor_id, id, "record_update", source_ip, false, json!({}))
                .await?;
            return Err(VaultError::Storage);
        }

        self.audit
            .log_phi_encryption(actor_id, id, source_ip)
            .await
            .map_err(audit_failure)?;
        self.audit_access(actor_id, id, "record_update", source_ip, true, json!({}))
            .await?;

        debug!(record_id = %id, "record updated");
        Ok(merged)
    }

    /// Search non-PHI identifiers only. PHI is never decrypted for search;
    /// results carry only the searchable identifier fields.
    pub async fn search_records(
        &self,
        term: &str,
        actor_id: &str,
        source_ip: &str,
    ) -> Result<Vec<Value>, VaultError> {
        let all = match self.store.list().await {
            Ok(all) => all,
            Err(err) => {
                error!(error = %err, "record scan failed");
                self.audit
                    .log_audit(
                        actor_id,
                        "records",
                        "record_search",
                        source_ip,
                        false,
                        json!({"reason": "storage_error", "term": term}),
                    )
                    .await
                    .map_err(audit_failure)?;
                return Err(VaultError::Storage);
            }
        };

        let needle = term.to_ascii_lowercase();
        let mut results = Vec::new();
        for record in &all {
            let Some(map) = record.as_object() else {
                continue;
            };
            let matched = SEARCHABLE_FIELDS.iter().any(|field| {
                map.get(*field)
                    .and_then(Value::as_str)
                    .is_some_and(|v| v.to_ascii_lowercase().contains(&needle))
            });
            if matched {
                let mut summary = Map::new();
                for field in SEARCHABLE_FIELDS {
                    if let Some(value) = map.get(*field) {
                        summary.insert((*field).to_string(), value.clone());
                    }
                }
                results.push(Value::Object(summary));
            }
        }

        self.audit
            .log_audit(
                actor_id,
                "records",
                "record_search",
                source_ip,
                true,
                json!({"term": term, "resultCount": results.len()}),
            )
            .await
            .map_err(audit_failure)?;

        Ok(results)
    }

    /// Remove a record, leaving an audit trail either way.
    pub async fn delete_record(
        &self,
        id: &str,
        actor_id: &str,
        source_ip: &str,
    ) -> Result<bool, VaultError> {
        let removed = match self.store.delete(id).await {
            Ok(removed) => removed,
            Err(err) => {
                error!(record_id = %id, error = %err, "record delete failed");
                self.audit_access(
                    actor_id,
                    id,
                    "record_delete",
                    source_ip,
                    false,
                    json!({"reason": "storage_error"}),
                )
                .await?;
                return Err(VaultError::Storage);
            }
        };

        self.audit_access(
            actor_id,
            id,
            "record_delete",
            source_ip,
            removed,
            if removed {
                json!({})
            } else {
                json!({"reason": "not_found"})
            },
        )
        .await?;

        Ok(removed)
    }

    async fn audit_access(
        &self,
        actor_id: &str,
        subject_id: &str,
        action: &str,
        source_ip: &str,
        success: bool,
        metadata: Value,
    ) -> Result<(), VaultError> {
        self.audit
            .log_patient_access(
                actor_id,
                subject_id,
                action,
                source_ip,
                success,
                sanitize_value(&metadata),
            )
            .await
            .map_err(audit_failure)
    }
}

fn audit_failure(err: crate::audit::AuditError) -> VaultError {
    // Fail closed: the operation that triggered this audit write must not
    // report success. Escalate for operational alerting.
    warn!(error = %err, "audit sink failure");
    VaultError::AuditSink
}
