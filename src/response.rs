use crate::submission::FieldErrors;
use serde::{Deserialize, Serialize};

pub const MSG_DELIVERED: &str = "Pesan berhasil dikirim! Terima kasih telah menghubungi saya.";

/// Every way a submission can be turned away. The `Display` text is the
/// message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContactError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Data tidak valid")]
    ValidationFailed(FieldErrors),
    #[error("Pesan terlalu panjang (maksimal {max} karakter)")]
    MessageTooLong { max: usize },
    #[error("Pesan terdeteksi sebagai spam")]
    SpamDetected,
    #[error("Mohon tunggu {remaining_secs} detik sebelum mengirim pesan lagi")]
    RateLimited { remaining_secs: i64 },
    #[error("Maaf, terjadi kesalahan saat mengirim pesan. Silakan coba lagi nanti.")]
    DeliveryFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ApiResponse {
    pub fn delivered() -> Self {
        Self {
            success: true,
            message: MSG_DELIVERED.to_string(),
            errors: None,
        }
    }
}

impl From<ContactError> for ApiResponse {
    fn from(err: ContactError) -> Self {
        let message = err.to_string();
        let errors = match err {
            ContactError::ValidationFailed(errors) => Some(errors),
            _ => None,
        };
        Self {
            success: false,
            message,
            errors,
        }
    }
}
