use super::DetectionResult;
use crate::config::SpamConfig;
use anyhow::Context;
use regex::Regex;

struct SpamPattern {
    name: &'static str,
    regex: Regex,
}

/// Ordered, case-insensitive spam heuristics over subject and message.
pub struct SpamFilter {
    patterns: Vec<SpamPattern>,
}

impl SpamFilter {
    pub fn from_config(config: &SpamConfig) -> anyhow::Result<Self> {
        let groups: [(&'static str, &[String], bool); 3] = [
            ("spam-keyword", &config.keywords, true),
            ("call-to-action", &config.phrases, true),
            ("url-marker", &config.url_markers, false),
        ];

        let mut patterns = Vec::new();
        for (name, terms, whole_words) in groups {
            if let Some(regex) = Self::compile_group(terms, whole_words)
                .with_context(|| format!("Failed to compile {name} pattern"))?
            {
                patterns.push(SpamPattern { name, regex });
            }
        }

        log::debug!("Spam filter loaded with {} pattern groups", patterns.len());
        Ok(Self { patterns })
    }

    fn compile_group(terms: &[String], whole_words: bool) -> anyhow::Result<Option<Regex>> {
        let alternatives: Vec<String> = terms
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(regex::escape)
            .collect();
        if alternatives.is_empty() {
            return Ok(None);
        }

        let joined = alternatives.join("|");
        let pattern = if whole_words {
            format!(r"(?i)\b(?:{joined})\b")
        } else {
            format!("(?i)(?:{joined})")
        };
        Ok(Some(Regex::new(&pattern)?))
    }

    /// First pattern that hits either field wins; message is checked before
    /// subject within each pattern.
    pub fn check(&self, subject: &str, message: &str) -> DetectionResult {
        for pattern in &self.patterns {
            for (field, text) in [("message", message), ("subject", subject)] {
                if let Some(found) = pattern.regex.find(text) {
                    return DetectionResult::hit(pattern.name, field, found.as_str());
                }
            }
        }
        DetectionResult::no_match("spam")
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}
