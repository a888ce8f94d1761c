use std::time::{Duration, Instant};

pub const NOTIFICATION_LIFETIME: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    shown_at: Instant,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) >= NOTIFICATION_LIFETIME
    }
}

/// Holds at most one banner. A new banner replaces the current one.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    current: Option<Notification>,
}

impl NotificationCenter {
    pub fn show(&mut self, message: &str, kind: NotificationKind) {
        self.show_at(message, kind, Instant::now());
    }

    pub fn show_at(&mut self, message: &str, kind: NotificationKind, now: Instant) {
        self.current = Some(Notification {
            message: message.to_string(),
            kind,
            shown_at: now,
        });
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    /// The visible banner, dropping it once its lifetime has passed.
    pub fn visible(&mut self, now: Instant) -> Option<&Notification> {
        if self.current.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.current = None;
        }
        self.current.as_ref()
    }

    /// Last banner shown, ignoring expiry.
    pub fn latest(&self) -> Option<&Notification> {
        self.current.as_ref()
    }
}
