pub mod fallback_log;
pub mod transport;

pub use fallback_log::FallbackLog;
pub use transport::{MailEnvelope, MailTransport, SendmailTransport, TransportDelivery};

use crate::message::ContactMessage;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Transport,
    FallbackLog,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryResult {
    pub delivered: bool,
    pub channel_used: Channel,
}

#[async_trait]
pub trait DeliveryStrategy: Send + Sync {
    fn channel(&self) -> Channel;

    async fn deliver(&self, message: &ContactMessage) -> bool;
}

/// Strategies tried in order; the first one that reports success wins.
pub struct DeliveryChannel {
    strategies: Vec<Box<dyn DeliveryStrategy>>,
}

impl DeliveryChannel {
    pub fn new(strategies: Vec<Box<dyn DeliveryStrategy>>) -> Self {
        Self { strategies }
    }

    pub async fn deliver(&self, message: &ContactMessage) -> DeliveryResult {
        for strategy in &self.strategies {
            if strategy.deliver(message).await {
                return DeliveryResult {
                    delivered: true,
                    channel_used: strategy.channel(),
                };
            }
            log::warn!(
                "Delivery via {:?} failed for {}",
                strategy.channel(),
                message.submission.email()
            );
        }
        DeliveryResult {
            delivered: false,
            channel_used: Channel::None,
        }
    }
}
