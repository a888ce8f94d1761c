use crate::rules::{
    char_length, FieldRule, CONTACT_FORM_RULES, FIELD_EMAIL, FIELD_MESSAGE, FIELD_NAME,
    FIELD_PHONE, FIELD_SUBJECT,
};
use crate::sanitize::sanitize_input;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Raw form fields as received. Missing fields read as empty strings.
#[derive(Debug, Default, Clone)]
pub struct SubmissionInput {
    fields: HashMap<String, String>,
}

impl SubmissionInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }

    pub fn get(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }
}

/// Per-field error messages, in the order the checks ran.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn insert(&mut self, field: &str, errors: Vec<String>) {
        self.0.insert(field.to_string(), errors);
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Field values that passed every rule, trimmed and escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedSubmission {
    name: String,
    email: String,
    phone: Option<String>,
    subject: String,
    message: String,
}

impl SanitizedSubmission {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Server-side checks for one field. A required empty field yields only the
/// "wajib diisi" error; an optional empty field yields nothing.
pub fn validate_field(rule: &FieldRule, value: &str) -> Vec<String> {
    let mut errors = Vec::new();
    let value = value.trim();

    if value.is_empty() {
        if rule.required {
            errors.push(rule.required_message());
        }
        return errors;
    }

    if let Some(min_length) = rule.min_length {
        if char_length(value) < min_length {
            errors.push(rule.min_length_message(min_length));
        }
    }

    if !rule.matches_pattern(value) {
        errors.push(rule.pattern_message());
    }

    errors
}

/// Run every rule in table order. Succeeds only when no field has errors.
pub fn validate_submission(input: &SubmissionInput) -> Result<SanitizedSubmission, FieldErrors> {
    let mut errors = FieldErrors::default();
    let mut sanitized: HashMap<&str, String> = HashMap::new();

    for rule in CONTACT_FORM_RULES.iter() {
        let value = input.get(rule.field);
        let field_errors = validate_field(rule, value);
        if !field_errors.is_empty() {
            errors.insert(rule.field, field_errors);
        } else if !value.trim().is_empty() {
            sanitized.insert(rule.field, sanitize_input(value));
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let phone = sanitized.remove(FIELD_PHONE);
    let mut take = |field: &str| sanitized.remove(field).unwrap_or_default();
    Ok(SanitizedSubmission {
        name: take(FIELD_NAME),
        email: take(FIELD_EMAIL),
        phone,
        subject: take(FIELD_SUBJECT),
        message: take(FIELD_MESSAGE),
    })
}
