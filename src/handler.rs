use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::delivery::{
    DeliveryChannel, DeliveryResult, FallbackLog, MailTransport, SendmailTransport,
    TransportDelivery,
};
use crate::detection::SpamFilter;
use crate::message::ContactMessage;
use crate::rate_limit::{RateDecision, RateLimiter};
use crate::response::{ApiResponse, ContactError};
use crate::rules::char_length;
use crate::submission::{validate_submission, SanitizedSubmission, SubmissionInput};
use std::sync::Arc;

/// One form POST as seen by the pipeline.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub method: String,
    pub input: SubmissionInput,
    pub client_id: String,
    pub user_agent: Option<String>,
}

impl SubmissionRequest {
    pub fn post(input: SubmissionInput, client_id: &str) -> Self {
        Self {
            method: "POST".to_string(),
            input,
            client_id: client_id.to_string(),
            user_agent: None,
        }
    }
}

/// The authoritative validate → screen → throttle → deliver pipeline.
pub struct SubmissionHandler {
    spam_filter: SpamFilter,
    rate_limiter: RateLimiter,
    delivery: DeliveryChannel,
    max_message_length: usize,
    clock: Arc<dyn Clock>,
}

impl SubmissionHandler {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let transport = Arc::new(SendmailTransport::new(
            config.delivery.sendmail_path.clone(),
        ));
        Self::with_parts(config, transport, Arc::new(SystemClock))
    }

    pub fn with_parts(
        config: &Config,
        transport: Arc<dyn MailTransport>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let delivery = DeliveryChannel::new(vec![
            Box::new(TransportDelivery::new(transport, &config.delivery)),
            Box::new(FallbackLog::new(&config.delivery.fallback_log_path)),
        ]);
        Ok(Self {
            spam_filter: SpamFilter::from_config(&config.spam)?,
            rate_limiter: RateLimiter::in_memory(config.limits.rate_limit_seconds),
            delivery,
            max_message_length: config.limits.max_message_length,
            clock,
        })
    }

    pub async fn handle(&self, request: SubmissionRequest) -> ApiResponse {
        match self.process(request).await {
            Ok(_) => ApiResponse::delivered(),
            Err(err) => err.into(),
        }
    }

    pub async fn process(&self, request: SubmissionRequest) -> Result<DeliveryResult, ContactError> {
        if !request.method.eq_ignore_ascii_case("POST") {
            return Err(ContactError::MethodNotAllowed);
        }

        let submission = self.screen(&request.input).inspect_err(|e| {
            log::debug!("Submission from {} rejected: {e}", request.client_id);
        })?;

        let now = self.clock.now();
        if let RateDecision::Limited { remaining_secs } = self
            .rate_limiter
            .check_and_record(&request.client_id, now.timestamp())
        {
            log::debug!(
                "Rate limited {} for another {remaining_secs}s",
                request.client_id
            );
            return Err(ContactError::RateLimited { remaining_secs });
        }

        let message = ContactMessage {
            submission,
            submitted_at: now,
            client_id: request.client_id,
            user_agent: request.user_agent,
        };
        let result = self.delivery.deliver(&message).await;
        let email = message.submission.email();
        if result.delivered {
            log::info!(
                "Contact form submitted successfully by: {email} (via {:?})",
                result.channel_used
            );
            Ok(result)
        } else {
            log::error!("Failed to send contact form from: {email}");
            Err(ContactError::DeliveryFailed)
        }
    }

    /// Validation, length cap and spam screen. Touches no shared state.
    pub fn screen(&self, input: &SubmissionInput) -> Result<SanitizedSubmission, ContactError> {
        let submission = validate_submission(input).map_err(ContactError::ValidationFailed)?;

        if char_length(submission.message()) > self.max_message_length {
            return Err(ContactError::MessageTooLong {
                max: self.max_message_length,
            });
        }

        let detection = self
            .spam_filter
            .check(submission.subject(), submission.message());
        if detection.matched {
            log::debug!(
                "Spam pattern {} matched in {}: {:?}",
                detection.rule_name,
                detection.field.as_deref().unwrap_or("?"),
                detection.evidence
            );
            return Err(ContactError::SpamDetected);
        }

        Ok(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::delivery::{Channel, MailEnvelope};
    use async_trait::async_trait;
    use chrono::{Local, TimeZone};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        accept: bool,
        sent: Mutex<Vec<MailEnvelope>>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, envelope: &MailEnvelope) -> bool {
            self.sent.lock().unwrap().push(envelope.clone());
            self.accept
        }
    }

    struct Fixture {
        handler: SubmissionHandler,
        transport: Arc<RecordingTransport>,
        clock: Arc<ManualClock>,
        _dir: tempfile::TempDir,
        log_path: std::path::PathBuf,
    }

    fn fixture(transport_accepts: bool) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("contact_messages.txt");
        let mut config = Config::default();
        config.delivery.fallback_log_path = log_path.to_string_lossy().to_string();

        let transport = Arc::new(RecordingTransport {
            accept: transport_accepts,
            ..Default::default()
        });
        let clock = Arc::new(ManualClock::new(
            Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
        ));
        let handler = SubmissionHandler::with_parts(&config, transport.clone(), clock.clone())
            .unwrap();
        Fixture {
            handler,
            transport,
            clock,
            _dir: dir,
            log_path,
        }
    }

    fn jane() -> SubmissionInput {
        SubmissionInput::new()
            .with_field("name", "Jane Doe")
            .with_field("email", "jane@example.com")
            .with_field("phone", "")
            .with_field("subject", "Hello there")
            .with_field("message", "This is a real message of sufficient length.")
    }

    #[tokio::test]
    async fn test_non_post_is_rejected() {
        let f = fixture(true);
        let mut request = SubmissionRequest::post(jane(), "198.51.100.1");
        request.method = "GET".to_string();
        let response = f.handler.handle(request).await;
        assert!(!response.success);
        assert_eq!(response.message, "Method not allowed");
        assert!(f.transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_accepted_via_transport() {
        let f = fixture(true);
        let mut request = SubmissionRequest::post(jane(), "198.51.100.1");
        request.user_agent = Some("curl/8.0".to_string());

        let result = f.handler.process(request).await.unwrap();
        assert_eq!(result.channel_used, Channel::Transport);

        let sent = f.transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].header("Reply-To"), Some("jane@example.com"));
        assert!(sent[0].body.contains("Telepon: Tidak disediakan"));
        assert!(sent[0].body.contains("User Agent: curl/8.0"));
        assert!(!f.log_path.exists());
    }

    #[tokio::test]
    async fn test_fallback_log_counts_as_success() {
        let f = fixture(false);
        let response = f
            .handler
            .handle(SubmissionRequest::post(jane(), "198.51.100.1"))
            .await;
        assert_eq!(response, ApiResponse::delivered());

        let logged = std::fs::read_to_string(&f.log_path).unwrap();
        assert!(logged.contains("=== PESAN BARU ==="));
        assert!(logged.contains("Nama: Jane Doe"));
        assert!(logged.contains("Email: jane@example.com"));
        assert!(logged.contains("Telepon: Tidak disediakan"));
        assert!(logged.contains("Subject: Hello there"));
        assert!(logged.contains("IP: 198.51.100.1"));
    }

    #[tokio::test]
    async fn test_validation_errors_are_returned_per_field() {
        let f = fixture(true);
        let input = SubmissionInput::new()
            .with_field("name", "J")
            .with_field("email", "bad")
            .with_field("subject", "hi")
            .with_field("message", "short");
        let response = f
            .handler
            .handle(SubmissionRequest::post(input, "198.51.100.1"))
            .await;

        assert!(!response.success);
        assert_eq!(response.message, "Data tidak valid");
        let errors = response.errors.unwrap();
        for field in ["name", "email", "subject", "message"] {
            assert!(errors.get(field).is_some(), "missing errors for {field}");
        }
        assert!(errors.get("phone").is_none());
    }

    #[tokio::test]
    async fn test_message_length_cap() {
        let f = fixture(true);
        let exact = jane().with_field("message", &"a".repeat(1000));
        assert!(f.handler.screen(&exact).is_ok());

        let over = jane().with_field("message", &"a".repeat(1001));
        assert_eq!(
            f.handler.screen(&over),
            Err(ContactError::MessageTooLong { max: 1000 })
        );
    }

    #[tokio::test]
    async fn test_spam_rejects_whole_submission() {
        let f = fixture(true);
        let input = jane().with_field("message", "Great offer, click here now to claim it");
        let response = f
            .handler
            .handle(SubmissionRequest::post(input, "198.51.100.1"))
            .await;
        assert!(!response.success);
        assert_eq!(response.message, "Pesan terdeteksi sebagai spam");
        assert!(f.transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_spam_does_not_consume_rate_limit() {
        let f = fixture(true);
        let spam = jane().with_field("subject", "Visit www.example.com");
        assert!(f
            .handler
            .process(SubmissionRequest::post(spam, "198.51.100.1"))
            .await
            .is_err());
        assert!(f
            .handler
            .process(SubmissionRequest::post(jane(), "198.51.100.1"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_rate_limit_reports_remaining_seconds() {
        let f = fixture(true);
        let client = "198.51.100.1";
        f.handler
            .process(SubmissionRequest::post(jane(), client))
            .await
            .unwrap();

        f.clock.advance_secs(10);
        let response = f
            .handler
            .handle(SubmissionRequest::post(jane(), client))
            .await;
        assert!(!response.success);
        assert_eq!(
            response.message,
            "Mohon tunggu 50 detik sebelum mengirim pesan lagi"
        );

        // The rejected attempt did not restart the window.
        f.clock.advance_secs(50);
        assert!(f
            .handler
            .process(SubmissionRequest::post(jane(), client))
            .await
            .is_ok());
        assert_eq!(f.transport.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_delivery_still_consumes_rate_limit() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        // A directory as log path makes the fallback fail too.
        config.delivery.fallback_log_path = dir.path().to_string_lossy().to_string();
        let clock = Arc::new(ManualClock::new(Local::now()));
        let handler = SubmissionHandler::with_parts(
            &config,
            Arc::new(RecordingTransport::default()),
            clock.clone(),
        )
        .unwrap();

        let response = handler
            .handle(SubmissionRequest::post(jane(), "198.51.100.9"))
            .await;
        assert!(!response.success);
        assert_eq!(
            response.message,
            "Maaf, terjadi kesalahan saat mengirim pesan. Silakan coba lagi nanti."
        );

        clock.advance_secs(1);
        assert_eq!(
            handler
                .process(SubmissionRequest::post(jane(), "198.51.100.9"))
                .await,
            Err(ContactError::RateLimited { remaining_secs: 59 })
        );
    }
}
