//! Notifier configuration document.
//!
//! The notifier is configured with a YAML document of the form:
//!
//! ```yaml
//! apiVersion: cloud-build-notifiers/v1
//! kind: SlackNotifier
//! metadata:
//!   name: example-slack-notifier
//! spec:
//!   notification:
//!     filter: build.status == Build.Status.SUCCESS
//!     params:
//!       buildStatus: $(build.status)
//!     delivery:
//!       webhookUrl:
//!         secretRef: webhook-url
//!     template:
//!       type: golang
//!       uri: slack.json
//!   secrets:
//!   - name: webhook-url
//!     value: projects/example/secrets/example-slack-notifier-webhook-url/versions/latest
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{NotifyError, Result};

/// The only config API version this notifier understands.
pub const API_VERSION: &str = "cloud-build-notifiers/v1";

/// Notification param holding the optional text template.
pub const MESSAGE_TEMPLATE_PARAM: &str = "messageTemplate";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifierConfig {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub spec: Spec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    pub notification: Notification,
    #[serde(default)]
    pub secrets: Vec<Secret>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Event filter expression; empty accepts every build
    #[serde(default)]
    pub filter: String,
    #[serde(default)]
    pub params: HashMap<String, String>,
    /// Delivery settings keyed by field name, e.g. `webhookUrl`
    #[serde(default)]
    pub delivery: HashMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub template: Option<TemplateRef>,
}

/// Where the block template lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateRef {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub uri: String,
}

/// A named secret resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    #[serde(rename = "name")]
    pub local_name: String,
    #[serde(rename = "value")]
    pub resource_name: String,
}

impl NotifierConfig {
    /// Parse and validate a config document.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Config`] if the YAML is malformed or the
    /// document fails [`validate`](Self::validate).
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw)
            .map_err(|e| NotifyError::Config(format!("failed to parse config YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            NotifyError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Check the document is one this notifier can run.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Config`] on an unsupported API version or a
    /// missing kind.
    pub fn validate(&self) -> Result<()> {
        if self.api_version != API_VERSION {
            return Err(NotifyError::Config(format!(
                "expected apiVersion {API_VERSION:?}, got {:?}",
                self.api_version
            )));
        }
        if self.kind.trim().is_empty() {
            return Err(NotifyError::Config("missing kind".to_string()));
        }
        Ok(())
    }

    /// The text template from the `messageTemplate` param, if set and
    /// non-empty.
    #[must_use]
    pub fn message_template(&self) -> Option<&str> {
        self.spec
            .notification
            .params
            .get(MESSAGE_TEMPLATE_PARAM)
            .map(String::as_str)
            .filter(|t| !t.is_empty())
    }

    /// Look up the `secretRef` of a delivery field.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Config`] if the field is absent or has no
    /// string `secretRef`.
    pub fn secret_ref(&self, field: &str) -> Result<&str> {
        let value = self.spec.notification.delivery.get(field).ok_or_else(|| {
            NotifyError::Config(format!("delivery config has no field {field:?}"))
        })?;

        value
            .get("secretRef")
            .and_then(serde_yaml::Value::as_str)
            .ok_or_else(|| {
                NotifyError::Config(format!(
                    "delivery field {field:?} is not a secret reference: {value:?}"
                ))
            })
    }

    /// Find the resource name of the secret with the given local name.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Secret`] if no secret matches, or more than one
    /// does.
    pub fn find_secret_resource(&self, secret_ref: &str) -> Result<&str> {
        let mut matches = self
            .spec
            .secrets
            .iter()
            .filter(|s| s.local_name == secret_ref);

        match (matches.next(), matches.next()) {
            (Some(secret), None) => Ok(secret.resource_name.as_str()),
            (None, _) => Err(NotifyError::Secret(format!(
                "no secret named {secret_ref:?} in config"
            ))),
            (Some(_), Some(_)) => Err(NotifyError::Secret(format!(
                "secret name {secret_ref:?} is declared more than once"
            ))),
        }
    }
}
