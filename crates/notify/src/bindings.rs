//! Resolution of notification params into template bindings.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{NotifyError, Result};
use crate::events::Build;

/// Resolved param name to value.
pub type Bindings = HashMap<String, String>;

/// Turns configured params into the values templates see under `Params`.
pub trait BindingResolver: Send + Sync {
    /// Resolve params against a build.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Binding`] if a param cannot be resolved.
    fn resolve(&self, params: &HashMap<String, String>, build: &Build) -> Result<Bindings>;
}

static BUILD_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\(build\.([A-Za-z0-9_.]+)\)$").unwrap());

/// Resolves `$(build.<path>)` references; other values pass through as-is.
///
/// Supported paths are `id`, `status`, `logUrl`, `projectId` and
/// `substitutions.<KEY>`. A missing substitution resolves to an empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParamBindingResolver;

impl ParamBindingResolver {
    fn lookup(path: &str, build: &Build) -> Option<String> {
        let value = match path {
            "id" => build.id.clone(),
            "status" => build.status.to_string(),
            "logUrl" => build.log_url.clone(),
            "projectId" => build.project_id.clone(),
            _ => {
                let key = path.strip_prefix("substitutions.")?;
                build.substitutions.get(key).cloned().unwrap_or_default()
            }
        };
        Some(value)
    }
}

impl BindingResolver for ParamBindingResolver {
    fn resolve(&self, params: &HashMap<String, String>, build: &Build) -> Result<Bindings> {
        params
            .iter()
            .map(|(name, value)| -> Result<(String, String)> {
                let Some(caps) = BUILD_REF_RE.captures(value.trim()) else {
                    return Ok((name.clone(), value.clone()));
                };
                let path = &caps[1];
                let resolved = Self::lookup(path, build).ok_or_else(|| {
                    NotifyError::Binding(format!(
                        "param {name:?} references unknown build field {path:?}"
                    ))
                })?;
                Ok((name.clone(), resolved))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::BuildStatus;

    fn build() -> Build {
        Build {
            id: "b-1".to_string(),
            status: BuildStatus::Timeout,
            log_url: "https://example.com/logs".to_string(),
            project_id: "proj".to_string(),
            substitutions: HashMap::from([("BRANCH_NAME".to_string(), "main".to_string())]),
        }
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_resolves_build_references() {
        let got = ParamBindingResolver
            .resolve(
                &params(&[
                    ("buildStatus", "$(build.status)"),
                    ("branch", "$(build.substitutions.BRANCH_NAME)"),
                    ("missing", "$(build.substitutions._NOPE)"),
                    ("logs", "$(build.logUrl)"),
                    ("team", "platform"),
                ]),
                &build(),
            )
            .unwrap();

        assert_eq!(got["buildStatus"], "TIMEOUT");
        assert_eq!(got["branch"], "main");
        assert_eq!(got["missing"], "");
        assert_eq!(got["logs"], "https://example.com/logs");
        assert_eq!(got["team"], "platform");
    }

    #[test]
    fn test_unknown_build_field_fails() {
        let err = ParamBindingResolver
            .resolve(&params(&[("x", "$(build.createTime)")]), &build())
            .unwrap_err();
        assert!(matches!(err, NotifyError::Binding(_)));
    }

    #[test]
    fn test_templates_pass_through() {
        let got = ParamBindingResolver
            .resolve(
                &params(&[("messageTemplate", "Build {{status}}")]),
                &build(),
            )
            .unwrap();
        assert_eq!(got["messageTemplate"], "Build {{status}}");
    }
}
