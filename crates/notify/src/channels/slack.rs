//! Slack incoming-webhook channel.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::renderer::WebhookMessage;
use crate::NotifyChannel;

/// Used when a 429 response carries no usable `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// Slack webhook notification channel.
pub struct SlackChannel {
    webhook_url: String,
    client: reqwest::Client,
}

impl SlackChannel {
    /// Create a Slack channel posting to `webhook_url`. An empty URL leaves
    /// the channel disabled.
    #[must_use]
    pub fn new(webhook_url: impl Into<String>) -> Self {
        let webhook_url = webhook_url.into();
        if webhook_url.is_empty() {
            debug!("Slack notifications disabled (empty webhook URL)");
        }
        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl NotifyChannel for SlackChannel {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn enabled(&self) -> bool {
        !self.webhook_url.is_empty()
    }

    async fn send(&self, message: &WebhookMessage) -> Result<(), ChannelError> {
        if !self.enabled() {
            return Err(ChannelError::NotConfigured("Slack webhook URL".to_string()));
        }

        let body = serde_json::to_vec(message)?;

        debug!(
            channel = "slack",
            attachments = message.attachments.len(),
            "Posting webhook message"
        );

        let response = self
            .client
            .post(&self.webhook_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(channel = "slack", "Notification sent successfully");
            return Ok(());
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

            warn!(channel = "slack", retry_after_secs, "Slack webhook rate limited");
            return Err(ChannelError::RateLimited { retry_after_secs });
        }

        let body = response.text().await.unwrap_or_default();

        warn!(
            channel = "slack",
            status = %status,
            body = %body,
            "Slack webhook request failed"
        );

        Err(ChannelError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_with_url() {
        let channel = SlackChannel::new("https://hooks.slack.com/services/T/B/X");
        assert!(channel.enabled());
        assert_eq!(channel.name(), "slack");
    }

    #[tokio::test]
    async fn test_send_without_url_is_not_configured() {
        let channel = SlackChannel::new("");
        assert!(!channel.enabled());

        let message = WebhookMessage {
            text: None,
            attachments: vec![],
        };
        assert!(matches!(
            channel.send(&message).await,
            Err(ChannelError::NotConfigured(_))
        ));
    }
}
