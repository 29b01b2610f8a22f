//! Event filters deciding whether a build is worth a notification.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::error::{NotifyError, Result};
use crate::events::{Build, BuildStatus};

/// Predicate evaluated before anything is rendered.
///
/// Returning `false` skips the build silently.
pub trait EventFilter: Send + Sync {
    fn apply(&self, build: &Build) -> bool;
}

impl<F> EventFilter for F
where
    F: Fn(&Build) -> bool + Send + Sync,
{
    fn apply(&self, build: &Build) -> bool {
        self(build)
    }
}

/// Filter that lets every build through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl EventFilter for AcceptAll {
    fn apply(&self, _build: &Build) -> bool {
        true
    }
}

static EQ_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^build\.status\s*(==|!=)\s*Build\.Status\.([A-Z_]+)$").unwrap()
});

static IN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^build\.status\s+in\s*\[(.*)\]$").unwrap());

static STATUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Build\.Status\.([A-Z_]+)$").unwrap());

/// Filter on build status, parsed from a filter expression.
///
/// Supported forms:
/// - `build.status == Build.Status.SUCCESS`
/// - `build.status != Build.Status.WORKING`
/// - `build.status in [Build.Status.SUCCESS, Build.Status.FAILURE]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFilter {
    statuses: HashSet<BuildStatus>,
    negate: bool,
}

impl StatusFilter {
    /// Match builds whose status is one of `statuses`.
    #[must_use]
    pub fn any_of(statuses: impl IntoIterator<Item = BuildStatus>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
            negate: false,
        }
    }

    /// Parse a filter expression.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Filter`] for anything outside the supported
    /// forms.
    pub fn parse(expression: &str) -> Result<Self> {
        let expr = expression.trim();
        let invalid = |reason: &str| NotifyError::Filter {
            expression: expression.to_string(),
            reason: reason.to_string(),
        };

        if let Some(caps) = EQ_RE.captures(expr) {
            return Ok(Self {
                statuses: HashSet::from([BuildStatus::from(&caps[2])]),
                negate: &caps[1] == "!=",
            });
        }

        if let Some(caps) = IN_RE.captures(expr) {
            let statuses = caps[1]
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| {
                    STATUS_RE
                        .captures(item)
                        .map(|c| BuildStatus::from(&c[1]))
                        .ok_or_else(|| invalid(&format!("{item:?} is not a Build.Status value")))
                })
                .collect::<Result<HashSet<_>>>()?;

            if statuses.is_empty() {
                return Err(invalid("empty status list"));
            }
            return Ok(Self::any_of(statuses));
        }

        Err(invalid("only build.status comparisons are supported"))
    }
}

impl EventFilter for StatusFilter {
    fn apply(&self, build: &Build) -> bool {
        self.statuses.contains(&build.status) != self.negate
    }
}

/// Build the filter for a config's filter expression. An empty expression
/// accepts every build.
///
/// # Errors
///
/// Returns [`NotifyError::Filter`] if the expression cannot be parsed.
pub fn from_expression(expression: &str) -> Result<Box<dyn EventFilter>> {
    if expression.trim().is_empty() {
        return Ok(Box::new(AcceptAll));
    }
    Ok(Box::new(StatusFilter::parse(expression)?))
}
