//! Recursive encrypt/decrypt/redact over nested records.
//!
//! Walks `serde_json::Value` trees and transforms only taxonomy fields:
//! sensitive string leaves become envelopes, sensitive object/array values
//! recurse with the same field set, and every non-taxonomy field passes
//! through byte-identical. `encrypt_object` stamps `_encrypted: true` plus
//! a timestamp on the top-level object; `decrypt_object` removes them.

use carelock_crypto::FieldCipher;
use serde_json::{Map, Value};

use crate::error::VaultError;
use crate::taxonomy::FieldSet;

/// Stamp marking a record as holding envelopes instead of plaintext.
pub const ENCRYPTED_STAMP: &str = "_encrypted";

/// Stamp recording when the record was encrypted (RFC 3339).
pub const ENCRYPTED_AT_STAMP: &str = "_encryptedAt";

const MAX_DEPTH: usize = 64;

/// Encrypt every taxonomy field of a record.
///
/// `fields` defaults to the standard taxonomy. Returns a new value; the
/// input is not modified.
pub fn encrypt_object(
    cipher: &FieldCipher,
    value: &Value,
    fields: Option<&FieldSet>,
) -> Result<Value, VaultError> {
    let fields = fields.unwrap_or_else(|| FieldSet::standard());
    let mut result = walk_encrypt(cipher, value, fields, 0)?;

    if let Value::Object(ref mut map) = result {
        map.insert(ENCRYPTED_STAMP.to_string(), Value::Bool(true));
        map.insert(
            ENCRYPTED_AT_STAMP.to_string(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );
    }
    Ok(result)
}

/// Decrypt every taxonomy field of a record and remove the stamps.
///
/// A field whose envelope fails to decrypt becomes `null`; the rest of the
/// record still decrypts. The whole read is never aborted by one bad field.
pub fn decrypt_object(
    cipher: &FieldCipher,
    value: &Value,
    fields: Option<&FieldSet>,
) -> Result<Value, VaultError> {
    let fields = fields.unwrap_or_else(|| FieldSet::standard());
    let mut result = walk_decrypt(cipher, value, fields, 0)?;

    if let Value::Object(ref mut map) = result {
        map.shift_remove(ENCRYPTED_STAMP);
        map.shift_remove(ENCRYPTED_AT_STAMP);
    }
    Ok(result)
}

/// Decrypt only an explicit allow list of fields, for minimal-exposure
/// reads (e.g. show a name without the diagnosis). Envelopes outside the
/// allow list stay opaque and the `_encrypted` stamp is kept.
pub fn partial_decrypt(
    cipher: &FieldCipher,
    value: &Value,
    allow: &FieldSet,
) -> Result<Value, VaultError> {
    walk_decrypt(cipher, value, allow, 0)
}

/// Whether a record carries the `_encrypted` stamp.
#[must_use]
pub fn is_encrypted(value: &Value) -> bool {
    value
        .get(ENCRYPTED_STAMP)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn walk_encrypt(
    cipher: &FieldCipher,
    value: &Value,
    fields: &FieldSet,
    depth: usize,
) -> Result<Value, VaultError> {
    if depth > MAX_DEPTH {
        return Err(VaultError::InvalidPayload);
    }

    match value {
        Value::Object(map) => {
            let mut result = Map::new();
            for (key, entry) in map {
                let transformed = if fields.contains(key) {
                    match entry {
                        Value::String(plaintext) => match cipher.encrypt_value(plaintext)? {
                            Some(blob) => Value::String(blob),
                            None => Value::Null,
                        },
                        Value::Object(_) | Value::Array(_) => {
                            walk_encrypt(cipher, entry, fields, depth + 1)?
                        }
                        other => other.clone(),
                    }
                } else {
                    match entry {
                        Value::Object(_) | Value::Array(_) => {
                            walk_encrypt(cipher, entry, fields, depth + 1)?
                        }
                        other => other.clone(),
                    }
                };
                result.insert(key.clone(), transformed);
            }
            Ok(Value::Object(result))
        }
        Value::Array(items) => {
            let mut result = Vec::with_capacity(items.len());
            for item in items {
                result.push(walk_encrypt(cipher, item, fields, depth + 1)?);
            }
            Ok(Value::Array(result))
        }
        other => Ok(other.clone()),
    }
}

fn walk_decrypt(
    cipher: &FieldCipher,
    value: &Value,
    fields: &FieldSet,
    depth: usize,
) -> Result<Value, VaultError> {
    if depth > MAX_DEPTH {
        return Err(VaultError::InvalidPayload);
    }

    match value {
        Value::Object(map) => {
            let mut result = Map::new();
            for (key, entry) in map {
                let transformed = if fields.contains(key) {
                    match entry {
                        // Fail closed per field: a bad envelope nulls the
                        // field, it never surfaces ciphertext or aborts.
                        Value::String(blob) => match cipher.decrypt_value(blob) {
                            Some(plaintext) => Value::String(plaintext),
                            None => Value::Null,
                        },
                        Value::Object(_) | Value::Array(_) => {
                            walk_decrypt(cipher, entry, fields, depth + 1)?
                        }
                        other => other.clone(),
                    }
                } else {
                    match entry {
                        Value::Object(_) | Value::Array(_) => {
                            walk_decrypt(cipher, entry, fields, depth + 1)?
                        }
                        other => other.clone(),
                    }
                };
                result.insert(key.clone(), transformed);
            }
            Ok(Value::Object(result))
        }
        Value::Array(items) => {
            let mut result = Vec::with_capacity(items.len());
            for item in items {
                result.push(walk_decrypt(cipher, item, fields, depth + 1)?);
            }
            Ok(Value::Array(result))
        }
        other => Ok(other.clone()),
    }
}
