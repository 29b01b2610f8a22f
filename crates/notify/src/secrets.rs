//! Secret lookup used to resolve the webhook URL.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::{NotifyError, Result};

/// Source of secret values, keyed by resource name.
#[async_trait]
pub trait SecretGetter: Send + Sync {
    /// Fetch the value of a secret resource.
    async fn get_secret(&self, resource_name: &str) -> Result<String>;
}

/// Secrets held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSecrets {
    values: HashMap<String, String>,
}

impl StaticSecrets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret value.
    #[must_use]
    pub fn with(mut self, resource_name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(resource_name.into(), value.into());
        self
    }
}

#[async_trait]
impl SecretGetter for StaticSecrets {
    async fn get_secret(&self, resource_name: &str) -> Result<String> {
        self.values
            .get(resource_name)
            .cloned()
            .ok_or_else(|| NotifyError::Secret(format!("secret {resource_name:?} not found")))
    }
}
