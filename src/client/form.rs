use crate::rules::{char_length, FieldRule, CONTACT_FORM_RULES, FIELD_ORDER};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldStatus {
    Neutral,
    Success,
    Error(String),
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub name: &'static str,
    pub value: String,
    pub status: FieldStatus,
}

impl FormField {
    pub fn error_text(&self) -> &str {
        match &self.status {
            FieldStatus::Error(message) => message,
            _ => "",
        }
    }

    /// Mirrors the visual state the page shows next to the input.
    pub fn show_error(&mut self, message: Option<String>) {
        self.status = match message {
            Some(message) => FieldStatus::Error(message),
            None if self.value.trim().is_empty() => FieldStatus::Neutral,
            None => FieldStatus::Success,
        };
    }
}

/// The five contact form inputs with their current values and states.
#[derive(Debug, Clone)]
pub struct ContactForm {
    fields: Vec<FormField>,
}

impl Default for ContactForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactForm {
    pub fn new() -> Self {
        Self {
            fields: FIELD_ORDER
                .iter()
                .map(|&name| FormField {
                    name,
                    value: String::new(),
                    status: FieldStatus::Neutral,
                })
                .collect(),
        }
    }

    /// Unknown field names are ignored, as a page without that input would.
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        match self.field_mut(name) {
            Some(field) => {
                field.value = value.to_string();
                true
            }
            None => false,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FormField> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [FormField] {
        &mut self.fields
    }

    /// Raw values, untrimmed and unescaped, as the browser would post them.
    pub fn values(&self) -> Vec<(&'static str, String)> {
        self.fields
            .iter()
            .map(|f| (f.name, f.value.clone()))
            .collect()
    }

    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.value.clear();
            field.status = FieldStatus::Neutral;
        }
    }
}

/// Browser-side checks. One error per field; the first failing rule wins.
pub struct ClientValidator {
    rules: &'static [FieldRule],
}

impl Default for ClientValidator {
    fn default() -> Self {
        Self {
            rules: CONTACT_FORM_RULES.as_slice(),
        }
    }
}

impl ClientValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&self, name: &str, value: &str) -> Option<String> {
        let rule = self.rules.iter().find(|r| r.field == name)?;
        let value = value.trim();

        if rule.required && value.is_empty() {
            return Some(rule.required_message());
        }
        if let Some(message) = rule.browser_pattern_message {
            if !value.is_empty() && !rule.matches_pattern(value) {
                return Some(message.to_string());
            }
        }
        if let Some(min_length) = rule.min_length {
            if char_length(value) < min_length {
                return Some(rule.min_length_message(min_length));
            }
        }
        None
    }

    /// Validates one field and updates its visual state.
    pub fn validate_field(&self, field: &mut FormField) -> bool {
        let error = self.check(field.name, &field.value);
        let valid = error.is_none();
        field.show_error(error);
        valid
    }

    /// Validates every field, in form order, without stopping at the first
    /// failure so that each input shows its own state.
    pub fn validate_form(&self, form: &mut ContactForm) -> bool {
        let mut all_valid = true;
        for field in form.fields_mut() {
            if !self.validate_field(field) {
                all_valid = false;
            }
        }
        all_valid
    }
}
