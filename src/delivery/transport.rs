use super::{Channel, DeliveryStrategy};
use crate::config::DeliveryConfig;
use crate::message::ContactMessage;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailEnvelope {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub headers: Vec<(String, String)>,
}

impl MailEnvelope {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// RFC 5322 rendering, as handed to `sendmail -t`. Header values are
    /// forced onto one line since sendmail reads recipients from headers.
    pub fn to_rfc822(&self) -> String {
        let mut out = format!(
            "To: {}\r\nSubject: {}\r\n",
            single_line(&self.to),
            single_line(&self.subject)
        );
        for (name, value) in &self.headers {
            out.push_str(&format!("{}: {}\r\n", single_line(name), single_line(value)));
        }
        out.push_str("\r\n");
        out.push_str(&self.body);
        out
    }
}

/// Replaces CR and LF with spaces so a value cannot start a new header.
pub fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// The external mail facility. Queueing and retries are its own business.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, envelope: &MailEnvelope) -> bool;
}

/// Pipes the message into a sendmail-compatible binary.
pub struct SendmailTransport {
    program: Option<String>,
}

impl SendmailTransport {
    pub fn new(program: Option<String>) -> Self {
        Self { program }
    }

    async fn pipe(program: &str, envelope: &MailEnvelope) -> std::io::Result<bool> {
        let mut child = Command::new(program)
            .arg("-t")
            .arg("-i")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(envelope.to_rfc822().as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            log::warn!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output.status.success())
    }
}

#[async_trait]
impl MailTransport for SendmailTransport {
    async fn send(&self, envelope: &MailEnvelope) -> bool {
        let Some(program) = self.program.as_deref() else {
            log::debug!("No sendmail binary configured, skipping mail transport");
            return false;
        };
        match Self::pipe(program, envelope).await {
            Ok(sent) => sent,
            Err(e) => {
                log::warn!("Failed to run {program}: {e}");
                false
            }
        }
    }
}

/// Builds the outgoing envelope and hands it to a [`MailTransport`].
pub struct TransportDelivery {
    transport: Arc<dyn MailTransport>,
    recipient: String,
    sender: String,
    subject_prefix: String,
    mailer: String,
}

impl TransportDelivery {
    pub fn new(transport: Arc<dyn MailTransport>, config: &DeliveryConfig) -> Self {
        Self {
            transport,
            recipient: config.recipient.clone(),
            sender: config.sender.clone(),
            subject_prefix: config.subject_prefix.clone(),
            mailer: config.mailer.clone(),
        }
    }

    pub fn envelope(&self, message: &ContactMessage) -> MailEnvelope {
        MailEnvelope {
            to: single_line(&self.recipient),
            subject: single_line(&format!(
                "{}{}",
                self.subject_prefix,
                message.submission.subject()
            )),
            body: message.mail_body(),
            headers: vec![
                ("From".to_string(), single_line(&self.sender)),
                (
                    "Reply-To".to_string(),
                    single_line(message.submission.email()),
                ),
                ("X-Mailer".to_string(), single_line(&self.mailer)),
                (
                    "Content-Type".to_string(),
                    "text/plain; charset=UTF-8".to_string(),
                ),
            ],
        }
    }
}

#[async_trait]
impl DeliveryStrategy for TransportDelivery {
    fn channel(&self) -> Channel {
        Channel::Transport
    }

    async fn deliver(&self, message: &ContactMessage) -> bool {
        self.transport.send(&self.envelope(message)).await
    }
}
