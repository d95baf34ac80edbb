//! Log redaction.
//!
//! Everything written to non-audit logs passes through here first. Values
//! that look like PHI or prior envelopes are replaced with a placeholder:
//! SSNs, phone numbers, long base64 runs, and any value under a key that
//! matches the credential patterns or the PHI taxonomy.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::taxonomy::{is_secret_key, is_sensitive};

/// Placeholder written in place of redacted content.
pub const REDACTED: &str = "[REDACTED]";

static SSN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("SSN pattern")
});

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b").expect("phone pattern")
});

// A standard-base64 run at least as long as a minimum envelope (64 raw
// bytes ≈ 88 encoded chars). Ordinary words never look like this.
static BLOB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9+/]{80,}={0,2}").expect("blob pattern")
});

/// Redact PHI-shaped content from free text.
#[must_use]
pub fn sanitize_text(text: &str) -> String {
    let text = BLOB_RE.replace_all(text, REDACTED);
    let text = SSN_RE.replace_all(&text, REDACTED);
    PHONE_RE.replace_all(&text, REDACTED).into_owned()
}

/// Redact a JSON value for logging.
///
/// Values under sensitive or credential-shaped keys are dropped wholesale;
/// remaining strings are scrubbed by pattern. Audit entries do not pass
/// through here by design — the audit trail is the one place PHI access is
/// recorded verbatim.
#[must_use]
pub fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut result = Map::new();
            for (key, entry) in map {
                if is_secret_key(key) || is_sensitive(key) {
                    result.insert(key.clone(), Value::String(REDACTED.to_string()));
                } else {
                    result.insert(key.clone(), sanitize_value(entry));
                }
            }
            Value::Object(result)
        }
        Value::Array(items) => Value::Array(items.iter().map(sanitize_value).collect()),
        Value::String(text) => Value::String(sanitize_text(text)),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_ssn() {
        assert_eq!(sanitize_text("ssn is 123-45-6789 ok"), "ssn is [REDACTED] ok");
    }

    #[test]
    fn redacts_phone_numbers() {
        assert_eq!(sanitize_text("call 555-123-4567"), "call [REDACTED]");
        assert_eq!(sanitize_text("call (555) 123-4567"), "call [REDACTED]");
        assert_eq!(sanitize_text("call +1-555-123-4567"), "call [REDACTED]");
    }

    #[test]
    fn redacts_envelope_shaped_base64() {
        let blob = "A".repeat(96);
        let line = format!("stored blob {blob} for record");
        assert_eq!(sanitize_text(&line), "stored blob [REDACTED] for record");
    }

    #[test]
    fn leaves_ordinary_text_alone() {
        assert_eq!(
            sanitize_text("patient checked in at desk 4"),
            "patient checked in at desk 4"
        );
    }

    #[test]
    fn redacts_sensitive_and_secret_keys() {
        let value = json!({
            "mrn": "PT-2025-001",
            "ssn": "123-45-6789",
            "apiToken": "abc123",
            "nested": {"diagnosis": "T2DM", "room": 4}
        });
        let clean = sanitize_value(&value);
        assert_eq!(clean["mrn"], json!("PT-2025-001"));
        assert_eq!(clean["ssn"], json!(REDACTED));
        assert_eq!(clean["apiToken"], json!(REDACTED));
        assert_eq!(clean["nested"]["diagnosis"], json!(REDACTED));
        assert_eq!(clean["nested"]["room"], json!(4));
    }

    #[test]
    fn scrubs_patterns_inside_allowed_string_fields() {
        let value = json!({"note": "patient SSN 123-45-6789 on file"});
        let clean = sanitize_value(&value);
        assert_eq!(clean["note"], json!("patient SSN [REDACTED] on file"));
    }

    #[test]
    fn arrays_are_walked() {
        let value = json!([{"password": "hunter2"}, "555-123-4567"]);
        let clean = sanitize_value(&value);
        assert_eq!(clean[0]["password"], json!(REDACTED));
        assert_eq!(clean[1], json!(REDACTED));
    }
}
