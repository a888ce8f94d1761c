pub mod client;
pub mod clock;
pub mod config;
pub mod delivery;
pub mod detection;
pub mod handler;
pub mod message;
pub mod rate_limit;
pub mod response;
pub mod rules;
pub mod sanitize;
pub mod server;
pub mod submission;

pub use client::{ClientValidator, ContactClient, ContactForm, SubmitOutcome};
pub use config::Config;
pub use delivery::{Channel, DeliveryChannel, DeliveryResult, MailEnvelope, MailTransport};
pub use handler::{SubmissionHandler, SubmissionRequest};
pub use response::{ApiResponse, ContactError};
pub use server::{build_router, AppState, ContactServer};
pub use submission::{FieldErrors, SanitizedSubmission, SubmissionInput};
