//! PHI field taxonomy.
//!
//! A fixed, versioned list of field names considered PHI. Only enumerated
//! fields are ever transformed by the traversal layer; everything else
//! passes through untouched. Matching is case-insensitive so `ssn` and
//! `SSN` are the same field.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Taxonomy revision. Bump when field lists change so persisted records
/// can be associated with the list that encrypted them.
pub const TAXONOMY_VERSION: u32 = 1;

/// Patient-identifying fields.
pub const IDENTITY_FIELDS: &[&str] = &[
    "firstName",
    "lastName",
    "middleName",
    "dateOfBirth",
    "ssn",
    "email",
    "phone",
    "address",
    "city",
    "zipCode",
    "emergencyContact",
];

/// Clinical content fields.
pub const CLINICAL_FIELDS: &[&str] = &[
    "diagnosis",
    "medications",
    "allergies",
    "labResults",
    "vitalSigns",
    "treatmentPlan",
    "clinicalNotes",
    "chiefComplaint",
    "visitSummary",
    "transcript",
];

/// Mental-health screening fields.
pub const MENTAL_HEALTH_FIELDS: &[&str] = &[
    "phq9Score",
    "gad7Score",
    "mentalHealthNotes",
    "psychiatricHistory",
];

/// Insurance and coverage fields.
pub const INSURANCE_FIELDS: &[&str] = &[
    "insuranceProvider",
    "policyNumber",
    "groupNumber",
    "memberId",
    "subscriberName",
];

/// Key-name substrings that mark a value as a credential for log redaction.
pub const SECRET_KEY_PATTERNS: &[&str] = &["password", "secret", "token", "credential"];

/// Non-PHI identifier fields that search is allowed to match against.
pub const SEARCHABLE_FIELDS: &[&str] = &["id", "mrn", "createdAt", "updatedAt"];

static STANDARD_FIELDS: Lazy<FieldSet> = Lazy::new(|| {
    FieldSet::from_names(
        IDENTITY_FIELDS
            .iter()
            .chain(CLINICAL_FIELDS)
            .chain(MENTAL_HEALTH_FIELDS)
            .chain(INSURANCE_FIELDS)
            .copied(),
    )
});

/// A set of sensitive field names with case-insensitive lookup.
#[derive(Debug, Clone)]
pub struct FieldSet {
    names: HashSet<String>,
}

impl FieldSet {
    /// Build a custom field set, e.g. an allow list for partial decryption.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// The full standard taxonomy: identity + clinical + mental-health +
    /// insurance.
    pub fn standard() -> &'static FieldSet {
        &STANDARD_FIELDS
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_ascii_lowercase())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Whether a field name is in the standard PHI taxonomy.
#[must_use]
pub fn is_sensitive(name: &str) -> bool {
    FieldSet::standard().contains(name)
}

/// Whether a key name looks like a credential (for log redaction).
#[must_use]
pub fn is_secret_key(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SECRET_KEY_PATTERNS.iter().any(|p| lower.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_covers_all_categories() {
        assert!(is_sensitive("ssn"));
        assert!(is_sensitive("diagnosis"));
        assert!(is_sensitive("phq9Score"));
        assert!(is_sensitive("policyNumber"));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert!(is_sensitive("SSN"));
        assert!(is_sensitive("FirstName"));
        assert!(is_sensitive("DIAGNOSIS"));
    }

    #[test]
    fn non_taxonomy_fields_are_not_sensitive() {
        assert!(!is_sensitive("id"));
        assert!(!is_sensitive("createdAt"));
        assert!(!is_sensitive("mrn"));
        assert!(!is_sensitive("visitType"));
    }

    #[test]
    fn secret_key_patterns() {
        assert!(is_secret_key("password"));
        assert!(is_secret_key("apiToken"));
        assert!(is_secret_key("CLIENT_SECRET"));
        assert!(!is_secret_key("username"));
    }

    #[test]
    fn custom_field_set() {
        let set = FieldSet::from_names(["firstName", "lastName"]);
        assert!(set.contains("firstname"));
        assert!(!set.contains("ssn"));
        assert_eq!(set.len(), 2);
    }
}
