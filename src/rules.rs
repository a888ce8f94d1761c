//! Declarative constraints for the five contact form fields.
//!
//! Both the server-side validator and the client-side validator read this
//! table, so a rule only ever changes in one place.

use lazy_static::lazy_static;
use regex::Regex;

pub const FIELD_NAME: &str = "name";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_PHONE: &str = "phone";
pub const FIELD_SUBJECT: &str = "subject";
pub const FIELD_MESSAGE: &str = "message";

/// Field identifiers in form order.
pub const FIELD_ORDER: [&str; 5] = [
    FIELD_NAME,
    FIELD_EMAIL,
    FIELD_PHONE,
    FIELD_SUBJECT,
    FIELD_MESSAGE,
];

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: &'static str,
    /// Shown verbatim in every error message for the field.
    pub label: &'static str,
    pub required: bool,
    pub min_length: Option<usize>,
    pub pattern: Option<Regex>,
    /// Message the browser-side validator shows when `pattern` fails.
    /// `None` leaves the pattern to the server.
    pub browser_pattern_message: Option<&'static str>,
}

impl FieldRule {
    pub fn required_message(&self) -> String {
        format!("{} wajib diisi", self.label)
    }

    pub fn min_length_message(&self, min_length: usize) -> String {
        format!("{} minimal {} karakter", self.label, min_length)
    }

    pub fn pattern_message(&self) -> String {
        format!("Format {} tidak valid", self.label)
    }

    pub fn pattern_checked_in_browser(&self) -> bool {
        self.browser_pattern_message.is_some()
    }

    pub fn matches_pattern(&self, value: &str) -> bool {
        self.pattern
            .as_ref()
            .map(|pattern| pattern.is_match(value))
            .unwrap_or(true)
    }
}

/// Length as the user perceives it, in characters rather than bytes.
pub fn char_length(value: &str) -> usize {
    value.chars().count()
}

lazy_static! {
    pub static ref CONTACT_FORM_RULES: Vec<FieldRule> = vec![
        FieldRule {
            field: FIELD_NAME,
            label: "Nama",
            required: true,
            min_length: Some(2),
            pattern: Some(Regex::new(r"^[a-zA-Z\s]+$").expect("valid name pattern")),
            browser_pattern_message: None,
        },
        FieldRule {
            field: FIELD_EMAIL,
            label: "Email",
            required: true,
            min_length: None,
            pattern: Some(Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern")),
            browser_pattern_message: Some("Format email tidak valid"),
        },
        FieldRule {
            field: FIELD_PHONE,
            label: "No. Telepon",
            required: false,
            min_length: None,
            pattern: Some(Regex::new(r"^\+?[0-9\s\-()]+$").expect("valid phone pattern")),
            browser_pattern_message: None,
        },
        FieldRule {
            field: FIELD_SUBJECT,
            label: "Subject",
            required: true,
            min_length: Some(5),
            pattern: None,
            browser_pattern_message: None,
        },
        FieldRule {
            field: FIELD_MESSAGE,
            label: "Pesan",
            required: true,
            min_length: Some(10),
            pattern: None,
            browser_pattern_message: None,
        },
    ];
}

pub fn rule_for(field: &str) -> Option<&'static FieldRule> {
    CONTACT_FORM_RULES.iter().find(|rule| rule.field == field)
}
