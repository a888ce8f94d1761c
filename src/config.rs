use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub spam: SpamConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub endpoint_path: String,
    /// Use the first X-Forwarded-For entry as the client identifier.
    /// Only enable behind a reverse proxy that sets the header itself.
    pub trust_forwarded_for: bool,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub recipient: String,
    pub sender: String,
    pub subject_prefix: String,
    pub mailer: String,
    /// Path to a sendmail-compatible binary. Without it the transport
    /// always fails and every message goes to the fallback log.
    pub sendmail_path: Option<String>,
    pub fallback_log_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_message_length: usize,
    pub rate_limit_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpamConfig {
    /// Matched as whole words.
    pub keywords: Vec<String>,
    /// Call-to-action phrases, matched on word boundaries.
    pub phrases: Vec<String>,
    /// Matched anywhere in the text.
    pub url_markers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            endpoint_path: "/submit".to_string(),
            trust_forwarded_for: false,
            max_body_bytes: 64 * 1024,
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            recipient: "owner@example.com".to_string(),
            sender: "Portfolio Website <noreply@portfolio.com>".to_string(),
            subject_prefix: "Pesan Baru dari Portfolio: ".to_string(),
            mailer: format!("contact-relay/{}", env!("CARGO_PKG_VERSION")),
            sendmail_path: None,
            fallback_log_path: "contact_messages.txt".to_string(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_message_length: 1000,
            rate_limit_seconds: 60,
        }
    }
}

impl Default for SpamConfig {
    fn default() -> Self {
        Self {
            keywords: [
                "viagra",
                "cialis",
                "casino",
                "poker",
                "lottery",
                "winner",
                "congratulations",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            phrases: ["click here", "visit now", "act now", "limited time"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            url_markers: ["http", "https", "www."]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            delivery: DeliveryConfig::default(),
            limits: LimitsConfig::default(),
            spam: SpamConfig::default(),
            logging: Some(LoggingConfig {
                level: "info".to_string(),
            }),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
