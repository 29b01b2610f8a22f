//! Delivery channels for rendered messages.

pub mod slack;

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::renderer::WebhookMessage;

/// Trait for channels a rendered message can be delivered to.
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Check if this channel is enabled/configured.
    fn enabled(&self) -> bool;

    /// Deliver a rendered message.
    async fn send(&self, message: &WebhookMessage) -> Result<(), ChannelError>;
}
