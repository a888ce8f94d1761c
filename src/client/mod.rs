//! Client side of the contact form: validates locally, posts only valid
//! forms, and renders the server's answer.

pub mod form;
pub mod notification;

pub use form::{ClientValidator, ContactForm, FieldStatus, FormField};
pub use notification::{Notification, NotificationCenter, NotificationKind};

use crate::response::ApiResponse;
use anyhow::Context;
use url::Url;

pub const MSG_FIX_FORM: &str = "Mohon perbaiki kesalahan pada form";
pub const MSG_SEND_FAILED: &str = "Terjadi kesalahan saat mengirim pesan";
pub const SUBMIT_LABEL: &str = "Kirim Pesan";
pub const SENDING_LABEL: &str = "Mengirim...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitButton {
    pub label: String,
    pub enabled: bool,
}

impl Default for SubmitButton {
    fn default() -> Self {
        Self {
            label: SUBMIT_LABEL.to_string(),
            enabled: true,
        }
    }
}

impl SubmitButton {
    /// Disables the button until the returned guard is dropped.
    pub fn busy(&mut self) -> BusyGuard<'_> {
        let original_label = std::mem::replace(&mut self.label, SENDING_LABEL.to_string());
        self.enabled = false;
        BusyGuard {
            button: self,
            original_label,
        }
    }
}

pub struct BusyGuard<'a> {
    button: &'a mut SubmitButton,
    original_label: String,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.button.label = std::mem::take(&mut self.original_label);
        self.button.enabled = true;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Local validation failed; nothing was sent.
    Invalid,
    Sent(ApiResponse),
    Rejected(ApiResponse),
    Failed(String),
}

pub struct ContactClient {
    endpoint: Url,
    http: reqwest::Client,
    validator: ClientValidator,
    pub notifications: NotificationCenter,
    pub button: SubmitButton,
}

impl ContactClient {
    pub fn new(endpoint: &str) -> anyhow::Result<Self> {
        let endpoint =
            Url::parse(endpoint).with_context(|| format!("Invalid endpoint URL: {endpoint}"))?;
        let http = reqwest::Client::builder()
            .user_agent(format!("contact-relay/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            endpoint,
            http,
            validator: ClientValidator::new(),
            notifications: NotificationCenter::default(),
            button: SubmitButton::default(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn submit(&mut self, form: &mut ContactForm) -> SubmitOutcome {
        if !self.validator.validate_form(form) {
            self.notifications
                .show(MSG_FIX_FORM, NotificationKind::Error);
            return SubmitOutcome::Invalid;
        }

        let result = {
            let _busy = self.button.busy();
            post_form(&self.http, &self.endpoint, form.values()).await
        };

        match result {
            Ok(response) if response.success => {
                self.notifications
                    .show(&response.message, NotificationKind::Success);
                form.reset();
                SubmitOutcome::Sent(response)
            }
            Ok(response) => {
                self.notifications
                    .show(&response.message, NotificationKind::Error);
                if let Some(errors) = &response.errors {
                    for (name, messages) in errors.iter() {
                        if let Some(field) = form.field_mut(name) {
                            field.show_error(messages.first().cloned());
                        }
                    }
                }
                SubmitOutcome::Rejected(response)
            }
            Err(e) => {
                log::warn!("Contact form request to {} failed: {e}", self.endpoint);
                self.notifications
                    .show(MSG_SEND_FAILED, NotificationKind::Error);
                SubmitOutcome::Failed(e.to_string())
            }
        }
    }
}

async fn post_form(
    http: &reqwest::Client,
    endpoint: &Url,
    values: Vec<(&'static str, String)>,
) -> reqwest::Result<ApiResponse> {
    let mut body = reqwest::multipart::Form::new();
    for (name, value) in values {
        body = body.text(name, value);
    }
    http.post(endpoint.clone())
        .multipart(body)
        .send()
        .await?
        .error_for_status()?
        .json::<ApiResponse>()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_guard_restores_button() {
        let mut button = SubmitButton::default();
        {
            let _busy = button.busy();
        }
        assert_eq!(button, SubmitButton::default());
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        assert!(ContactClient::new("not a url").is_err());
    }

    #[tokio::test]
    async fn test_invalid_form_is_never_sent() {
        // Nothing listens on this port; a request would fail with a
        // different outcome than Invalid.
        let mut client = ContactClient::new("http://127.0.0.1:9/submit").unwrap();
        let mut form = ContactForm::new();
        form.set("name", "J");

        assert_eq!(client.submit(&mut form).await, SubmitOutcome::Invalid);
        let banner = client.notifications.latest().unwrap();
        assert_eq!(banner.message, MSG_FIX_FORM);
        assert_eq!(banner.kind, NotificationKind::Error);
        assert_eq!(form.field("name").unwrap().error_text(), "Nama minimal 2 karakter");
    }

    #[tokio::test]
    async fn test_network_failure_restores_button() {
        let mut client = ContactClient::new("http://127.0.0.1:9/submit").unwrap();
        let mut form = ContactForm::new();
        form.set("name", "Jane Doe");
        form.set("email", "jane@example.com");
        form.set("subject", "Hello there");
        form.set("message", "This is a real message of sufficient length.");

        let outcome = client.submit(&mut form).await;
        assert!(matches!(outcome, SubmitOutcome::Failed(_)));
        assert_eq!(client.notifications.latest().unwrap().message, MSG_SEND_FAILED);
        assert_eq!(client.button, SubmitButton::default());
        // The form keeps its values so the user can retry.
        assert_eq!(form.field("name").unwrap().value, "Jane Doe");
    }
}
