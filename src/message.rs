use crate::clock::format_timestamp;
use crate::submission::SanitizedSubmission;
use chrono::{DateTime, Local};

const PHONE_NOT_PROVIDED: &str = "Tidak disediakan";
const USER_AGENT_UNKNOWN: &str = "Tidak diketahui";

/// One accepted submission plus the request metadata delivery needs.
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub submission: SanitizedSubmission,
    pub submitted_at: DateTime<Local>,
    pub client_id: String,
    pub user_agent: Option<String>,
}

impl ContactMessage {
    fn phone_display(&self) -> &str {
        self.submission.phone().unwrap_or(PHONE_NOT_PROVIDED)
    }

    pub fn mail_body(&self) -> String {
        let s = &self.submission;
        format!(
            "\nPesan baru dari portfolio website:\n\
             \n\
             Nama: {name}\n\
             Email: {email}\n\
             Telepon: {phone}\n\
             Subject: {subject}\n\
             \n\
             Pesan:\n\
             {message}\n\
             \n\
             ---\n\
             Dikirim pada: {at}\n\
             IP Address: {ip}\n\
             User Agent: {agent}\n",
            name = s.name(),
            email = s.email(),
            phone = self.phone_display(),
            subject = s.subject(),
            message = s.message(),
            at = format_timestamp(&self.submitted_at),
            ip = self.client_id,
            agent = self.user_agent.as_deref().unwrap_or(USER_AGENT_UNKNOWN),
        )
    }

    /// Block appended to the fallback log. Field values may span lines, so
    /// the `=== PESAN BARU ===` marker is not a safe record delimiter.
    pub fn log_entry(&self) -> String {
        let s = &self.submission;
        format!(
            "\n=== PESAN BARU ===\n\
             Tanggal: {at}\n\
             Nama: {name}\n\
             Email: {email}\n\
             Telepon: {phone}\n\
             Subject: {subject}\n\
             Pesan: {message}\n\
             IP: {ip}\n\
             ==================\n\n",
            at = format_timestamp(&self.submitted_at),
            name = s.name(),
            email = s.email(),
            phone = self.phone_display(),
            subject = s.subject(),
            message = s.message(),
            ip = self.client_id,
        )
    }
}
