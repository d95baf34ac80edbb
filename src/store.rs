//! Record storage seam.
//!
//! The backing store is an external collaborator; it only ever sees
//! encrypted envelopes. `MemoryStore` is the in-tree reference
//! implementation, used in tests and as the backend for small deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;

/// Opaque storage failure. The service logs the detail and surfaces a
/// generic error to callers.
#[derive(Debug, Error)]
#[error("storage backend error: {0}")]
pub struct StoreError(pub String);

/// Persistence operations over encrypted records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn put(&self, id: &str, record: Value) -> Result<(), StoreError>;
    async fn get(&self, id: &str) -> Result<Option<Value>, StoreError>;
    /// Returns whether a record was actually removed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
    async fn list(&self) -> Result<Vec<Value>, StoreError>;
}

/// In-memory store: a `parking_lot::Mutex` over a `HashMap`, like the
/// document store's memory-mapped backend. Uncontended locks are near-zero
/// overhead.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn put(&self, id: &str, record: Value) -> Result<(), StoreError> {
        self.records.lock().insert(id.to_string(), record);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.records.lock().get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.records.lock().remove(id).is_some())
    }

    async fn list(&self) -> Result<Vec<Value>, StoreError> {
        let records = self.records.lock();
        let mut all: Vec<Value> = records.values().cloned().collect();
        // HashMap iteration order is arbitrary; sort for determinism
        all.sort_unstable_by(|a, b| {
            let a_id = a.get("id").and_then(Value::as_str).unwrap_or_default();
            let b_id = b.get("id").and_then(Value::as_str).unwrap_or_default();
            a_id.cmp(b_id)
        });
        Ok(all)
    }
}
