//! Slack notifications for build lifecycle events.
//!
//! This crate turns a build-status event into a Slack Block Kit message using
//! a user-supplied Handlebars template, and posts it to an incoming webhook.
//!
//! # Usage
//!
//! ```no_run
//! use std::collections::HashMap;
//! use build_notify::{Build, MessageRenderer};
//!
//! let renderer = MessageRenderer::new(
//!     r#"[{"type": "section", "text": {"type": "mrkdwn", "text": "Build {{Build.Status}}"}}]"#,
//!     Some("Build {{status}} for project {{projectId}}"),
//! )?;
//!
//! let build = Build::from_json(r#"{"id": "b-1", "status": "SUCCESS", "projectId": "demo"}"#)?;
//! let message = renderer.render(&build, &HashMap::new())?;
//! assert_eq!(message.attachments[0].color, "#22bb33");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Templates
//!
//! The block template must render to a JSON array of Block Kit blocks. Both
//! templates see the build under `Build` (`Build.Id`, `Build.Status`,
//! `Build.LogUrl`, `Build.ProjectId`, `Build.Substitutions`), resolved params
//! under `Params`, and lower-case shorthands for the build fields. Three
//! helpers are available besides the Handlebars built-ins:
//!
//! - `{{replace value "old" "new"}}`
//! - `{{jsonEscape value}}` for values embedded in JSON strings
//! - `{{lookup Build.Substitutions "KEY"}}`, empty when the key is absent
//!
//! Rendering is strict: a misspelled path such as `{{Build.Stauts}}` fails
//! the event. Read substitutions and params that may be absent with `lookup`.
//!
//! # Architecture
//!
//! - [`MessageRenderer`] compiles templates once and renders per build
//! - [`SlackNotifier`] filters, resolves params, renders, and delivers
//! - [`EventFilter`], [`BindingResolver`], [`SecretGetter`] and
//!   [`NotifyChannel`] are the seams to the hosting pipeline

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bindings;
pub mod blocks;
pub mod channels;
pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod notifier;
pub mod renderer;
pub mod secrets;
pub mod templates;

pub use bindings::{BindingResolver, Bindings, ParamBindingResolver};
pub use blocks::Block;
pub use channels::slack::SlackChannel;
pub use channels::NotifyChannel;
pub use config::NotifierConfig;
pub use error::{ChannelError, NotifyError};
pub use events::{Build, BuildStatus, StatusClass};
pub use filter::{AcceptAll, EventFilter, StatusFilter};
pub use notifier::{Outcome, SlackNotifier};
pub use renderer::{Attachment, MessageRenderer, WebhookMessage};
pub use secrets::{SecretGetter, StaticSecrets};
