use async_trait::async_trait;
use contact_relay::client::{FieldStatus, NotificationKind, SUBMIT_LABEL};
use contact_relay::clock::SystemClock;
use contact_relay::{
    Config, ContactClient, ContactForm, ContactServer, MailEnvelope, MailTransport,
    SubmissionHandler, SubmitOutcome,
};
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};

#[derive(Default)]
struct AcceptingTransport {
    sent: Mutex<Vec<MailEnvelope>>,
}

#[async_trait]
impl MailTransport for AcceptingTransport {
    async fn send(&self, envelope: &MailEnvelope) -> bool {
        self.sent.lock().expect("sent lock").push(envelope.clone());
        true
    }
}

async fn start_server() -> (String, Arc<AcceptingTransport>, TempDir) {
    let dir = tempdir().expect("tempdir");
    let mut config = Config::default();
    config.delivery.fallback_log_path = dir
        .path()
        .join("contact_messages.txt")
        .to_string_lossy()
        .to_string();

    let transport = Arc::new(AcceptingTransport::default());
    let handler =
        SubmissionHandler::with_parts(&config, transport.clone(), Arc::new(SystemClock))
            .expect("handler");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let server = ContactServer::with_handler(&config, handler);
    tokio::spawn(async move {
        server
            .serve(listener, std::future::pending())
            .await
            .expect("serve app")
    });

    (format!("http://{addr}/submit"), transport, dir)
}

fn filled_form(message: &str) -> ContactForm {
    let mut form = ContactForm::new();
    form.set("name", "Jane Doe");
    form.set("email", "jane@example.com");
    form.set("phone", "+62 812-3456");
    form.set("subject", "Project inquiry");
    form.set("message", message);
    form
}

#[tokio::test]
async fn accepted_submission_resets_form_and_shows_success() {
    let (endpoint, transport, _dir) = start_server().await;
    let mut client = ContactClient::new(&endpoint).expect("client");
    let mut form = filled_form("I would like to talk about a website.");

    let outcome = client.submit(&mut form).await;
    assert!(matches!(outcome, SubmitOutcome::Sent(_)));

    let banner = client.notifications.latest().expect("notification");
    assert_eq!(banner.kind, NotificationKind::Success);
    assert_eq!(
        banner.message,
        "Pesan berhasil dikirim! Terima kasih telah menghubungi saya."
    );
    assert!(form
        .fields()
        .iter()
        .all(|f| f.value.is_empty() && f.status == FieldStatus::Neutral));
    assert_eq!(client.button.label, SUBMIT_LABEL);
    assert!(client.button.enabled);

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Pesan Baru dari Portfolio: Project inquiry");
    assert_eq!(sent[0].header("Reply-To"), Some("jane@example.com"));
    assert!(sent[0].body.contains("Telepon: +62 812-3456"));
}

#[tokio::test]
async fn server_rejection_is_rendered_and_form_is_kept() {
    let (endpoint, transport, _dir) = start_server().await;
    let mut client = ContactClient::new(&endpoint).expect("client");
    let mut form = filled_form("Visit www.cheap-stuff.example for a deal");

    let outcome = client.submit(&mut form).await;
    let SubmitOutcome::Rejected(response) = outcome else {
        panic!("expected rejection, got {outcome:?}");
    };
    assert!(!response.success);
    assert_eq!(response.message, "Pesan terdeteksi sebagai spam");

    let banner = client.notifications.latest().expect("notification");
    assert_eq!(banner.kind, NotificationKind::Error);
    assert_eq!(banner.message, "Pesan terdeteksi sebagai spam");
    assert_eq!(form.field("name").unwrap().value, "Jane Doe");
    assert!(transport.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn server_side_field_errors_are_applied_to_inputs() {
    let (endpoint, _transport, _dir) = start_server().await;
    let mut client = ContactClient::new(&endpoint).expect("client");
    // Digits pass the browser checks but not the server's name pattern.
    let mut form = filled_form("I would like to talk about a website.");
    form.set("name", "R2D2");

    let outcome = client.submit(&mut form).await;
    assert!(matches!(outcome, SubmitOutcome::Rejected(_)));
    assert_eq!(
        client.notifications.latest().unwrap().message,
        "Data tidak valid"
    );
    assert_eq!(
        form.field("name").unwrap().error_text(),
        "Format Nama tidak valid"
    );
}
