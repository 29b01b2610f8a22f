//! Build event types consumed by the notifier.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Lifecycle status of a build.
///
/// Statuses this crate does not know about are kept verbatim in
/// [`BuildStatus::Other`] so that a newer pipeline never breaks parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildStatus {
    #[default]
    StatusUnknown,
    Pending,
    Queued,
    Working,
    Success,
    Failure,
    InternalError,
    Timeout,
    Cancelled,
    Expired,
    Other(String),
}

impl BuildStatus {
    /// Get the wire name for this status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::StatusUnknown => "STATUS_UNKNOWN",
            Self::Pending => "PENDING",
            Self::Queued => "QUEUED",
            Self::Working => "WORKING",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
            Self::Other(name) => name,
        }
    }

    /// Classify this status for color coding.
    #[must_use]
    pub const fn class(&self) -> StatusClass {
        match self {
            Self::Success => StatusClass::Success,
            Self::Failure | Self::InternalError | Self::Timeout => StatusClass::Failure,
            _ => StatusClass::Neutral,
        }
    }
}

impl From<String> for BuildStatus {
    fn from(name: String) -> Self {
        match name.as_str() {
            "" | "STATUS_UNKNOWN" => Self::StatusUnknown,
            "PENDING" => Self::Pending,
            "QUEUED" => Self::Queued,
            "WORKING" => Self::Working,
            "SUCCESS" => Self::Success,
            "FAILURE" => Self::Failure,
            "INTERNAL_ERROR" => Self::InternalError,
            "TIMEOUT" => Self::Timeout,
            "CANCELLED" => Self::Cancelled,
            "EXPIRED" => Self::Expired,
            _ => Self::Other(name),
        }
    }
}

impl From<&str> for BuildStatus {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<BuildStatus> for String {
    fn from(status: BuildStatus) -> Self {
        match status {
            BuildStatus::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-way grouping of build statuses used for attachment colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// The build succeeded
    Success,
    /// The build failed, errored or timed out
    Failure,
    /// Anything else: in flight, cancelled, expired or unknown
    Neutral,
}

impl StatusClass {
    /// Get the Slack attachment color for this class.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Success => "#22bb33", // Green
            Self::Failure => "#bb2124", // Red
            Self::Neutral => "#f0ad4e", // Amber
        }
    }
}

/// Read-only view of a build record as delivered by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Build {
    pub id: String,
    pub status: BuildStatus,
    pub log_url: String,
    pub project_id: String,
    pub substitutions: HashMap<String, String>,
}

impl Build {
    /// Parse a build from the pipeline's JSON representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a JSON object of the build shape.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Attachment color for this build's status.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        self.status.class().color()
    }
}
