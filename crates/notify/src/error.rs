//! Error types for the notification system.

use thiserror::Error;

/// Errors that can occur when delivering a rendered message to a channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Channel is not configured
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Rate limited by the service
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The webhook answered with a non-success status
    #[error("Webhook returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Errors raised while setting up a notifier or handling a single build event.
///
/// `Config`, `Filter`, `Secret` and `TemplateParse` are raised at set-up time
/// and keep the notifier from activating. The rest abort only the event being
/// processed.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The notifier configuration is missing or malformed
    #[error("invalid notifier config: {0}")]
    Config(String),

    /// The event filter expression could not be parsed
    #[error("failed to make event filter from {expression:?}: {reason}")]
    Filter { expression: String, reason: String },

    /// A secret could not be located or read
    #[error("failed to get secret: {0}")]
    Secret(String),

    /// A template failed to compile
    #[error("failed to parse {name} template: {source}")]
    TemplateParse {
        name: &'static str,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    /// A template failed while rendering against a build
    #[error("failed to execute {name} template: {source}")]
    TemplateRender {
        name: &'static str,
        #[source]
        source: Box<handlebars::RenderError>,
    },

    /// The rendered block template is not a valid block array
    #[error("failed to unmarshal templating JSON: {source} (rendered: {snippet})")]
    BlockParse {
        snippet: String,
        #[source]
        source: serde_json::Error,
    },

    /// A notification param could not be bound to the build
    #[error("failed to resolve bindings: {0}")]
    Binding(String),

    /// Delivery to the webhook failed
    #[error("failed to deliver notification: {0}")]
    Delivery(#[from] ChannelError),
}

impl NotifyError {
    /// Whether this error happened while setting up the notifier rather than
    /// while handling an event.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Filter { .. } | Self::Secret(_) | Self::TemplateParse { .. }
        )
    }
}

/// Result alias for notifier operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
