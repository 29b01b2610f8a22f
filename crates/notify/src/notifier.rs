//! The Slack notifier: filter, bind, render and deliver one build at a time.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::bindings::BindingResolver;
use crate::channels::slack::SlackChannel;
use crate::channels::NotifyChannel;
use crate::config::NotifierConfig;
use crate::error::Result;
use crate::events::Build;
use crate::filter::{self, EventFilter};
use crate::renderer::{MessageRenderer, WebhookMessage};
use crate::secrets::SecretGetter;

/// Delivery field holding the webhook URL secret reference.
pub const WEBHOOK_URL_SECRET_NAME: &str = "webhookUrl";

/// What happened to a build handed to [`SlackNotifier::send_notification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The filter rejected the build; nothing was rendered or sent
    Skipped,
    /// The message was rendered and accepted by the webhook
    Delivered,
}

/// A configured notifier.
///
/// Holds no per-event state, so it can be shared across tasks behind an
/// [`Arc`].
pub struct SlackNotifier {
    filter: Box<dyn EventFilter>,
    resolver: Arc<dyn BindingResolver>,
    renderer: MessageRenderer,
    params: HashMap<String, String>,
    channel: Arc<dyn NotifyChannel>,
}

impl SlackNotifier {
    /// Set up a notifier from its config and block template.
    ///
    /// The webhook URL is read through `secrets` using the config's
    /// `webhookUrl` secret reference.
    ///
    /// # Errors
    ///
    /// Fails if the config is invalid, the filter cannot be parsed, the
    /// webhook secret cannot be resolved, or either template fails to
    /// compile.
    pub async fn set_up(
        config: &NotifierConfig,
        block_kit_template: &str,
        secrets: &dyn SecretGetter,
        resolver: Arc<dyn BindingResolver>,
    ) -> Result<Self> {
        config.validate()?;

        let secret_ref = config.secret_ref(WEBHOOK_URL_SECRET_NAME)?;
        let resource = config.find_secret_resource(secret_ref)?;
        let webhook_url = secrets.get_secret(resource).await?;

        let notifier = Self::with_channel(
            config,
            block_kit_template,
            resolver,
            Arc::new(SlackChannel::new(webhook_url)),
        )?;

        info!(
            notifier = %config.metadata.name,
            has_text_template = notifier.renderer.has_text_template(),
            "Slack notifier set up"
        );
        Ok(notifier)
    }

    /// Set up a notifier that delivers to an explicit channel.
    ///
    /// # Errors
    ///
    /// Fails if the filter cannot be parsed or either template fails to
    /// compile.
    pub fn with_channel(
        config: &NotifierConfig,
        block_kit_template: &str,
        resolver: Arc<dyn BindingResolver>,
        channel: Arc<dyn NotifyChannel>,
    ) -> Result<Self> {
        let filter = filter::from_expression(&config.spec.notification.filter)?;
        let renderer = MessageRenderer::new(block_kit_template, config.message_template())?;

        Ok(Self {
            filter,
            resolver,
            renderer,
            params: config.spec.notification.params.clone(),
            channel,
        })
    }

    /// Replace the filter built from the config expression.
    #[must_use]
    pub fn with_filter(mut self, filter: Box<dyn EventFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Resolve bindings and render the message for a build, without
    /// filtering or delivering it.
    ///
    /// # Errors
    ///
    /// Fails if bindings cannot be resolved or rendering fails.
    pub fn write_message(&self, build: &Build) -> Result<WebhookMessage> {
        let bindings = self.resolver.resolve(&self.params, build)?;
        self.renderer.render(build, &bindings)
    }

    /// Handle one build event.
    ///
    /// # Errors
    ///
    /// Any failure aborts this event only; nothing is sent unless the whole
    /// message rendered.
    pub async fn send_notification(&self, build: &Build) -> Result<Outcome> {
        if !self.filter.apply(build) {
            debug!(build_id = %build.id, status = %build.status, "Build filtered out, skipping");
            return Ok(Outcome::Skipped);
        }

        info!(
            build_id = %build.id,
            status = %build.status,
            "sending Slack webhook for build"
        );

        let message = self.write_message(build).inspect_err(|e| {
            error!(build_id = %build.id, error = %e, "Failed to write Slack message");
        })?;

        self.channel.send(&message).await.inspect_err(|e| {
            error!(
                build_id = %build.id,
                channel = self.channel.name(),
                error = %e,
                "Failed to send notification"
            );
        })?;

        Ok(Outcome::Delivered)
    }
}
