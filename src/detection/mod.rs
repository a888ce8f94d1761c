pub mod spam_patterns;

pub use spam_patterns::SpamFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionResult {
    pub matched: bool,
    pub rule_name: String,
    /// Which submission field triggered the match.
    pub field: Option<String>,
    pub evidence: Option<String>,
}

impl DetectionResult {
    pub fn hit(rule_name: &str, field: &str, evidence: &str) -> Self {
        Self {
            matched: true,
            rule_name: rule_name.to_string(),
            field: Some(field.to_string()),
            evidence: Some(evidence.to_string()),
        }
    }

    pub fn no_match(rule_name: &str) -> Self {
        Self {
            matched: false,
            rule_name: rule_name.to_string(),
            field: None,
            evidence: None,
        }
    }
}
