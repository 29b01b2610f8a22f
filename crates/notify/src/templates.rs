//! Handlebars setup for notification templates.
//!
//! Templates see a [`TemplateView`] and three helpers on top of the Handlebars
//! built-ins:
//! - `{{replace value "old" "new"}}` replaces every occurrence of `old`
//! - `{{jsonEscape value}}` makes a value safe inside a JSON string literal
//! - `{{lookup map "key"}}` reads a map entry, empty when the key is absent
//!
//! The registry runs in strict mode: a path that does not exist in the view,
//! such as `{{Build.Stauts}}`, fails the render. Map entries whose presence
//! varies per build (`Build.Substitutions`, `substitutions`, `Params`) are read
//! with `lookup`, which renders a missing key as the empty string.
//!
//! Output is never HTML-escaped, since the block template produces JSON, not
//! markup.

use handlebars::{
    Context as HbsContext, Handlebars, Helper, HelperResult, JsonValue, Output, PathAndJson,
    RenderContext, RenderError, RenderErrorReason,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::events::{Build, BuildStatus};

/// Registry name of the block template.
pub const BLOCK_TEMPLATE: &str = "blockkit_template";

/// Registry name of the optional text template.
pub const TEXT_TEMPLATE: &str = "message_template";

/// Display form of a template value. `null` becomes the empty string.
fn display_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Escape a value for embedding inside a JSON string literal.
///
/// The result has no surrounding quotes. `null` escapes to the empty string.
#[must_use]
pub fn json_escape(value: &JsonValue) -> String {
    let raw = display_value(value);
    match serde_json::to_string(&raw) {
        Ok(quoted) => quoted[1..quoted.len() - 1].to_string(),
        // Falls back to the unescaped input, matching the notifier's
        // historical behavior.
        Err(_) => raw,
    }
}

/// Fetch helper param `idx`, failing when it names a path the view lacks.
fn param<'a, 'rc>(
    h: &'a Helper<'rc>,
    idx: usize,
) -> Result<Option<&'a PathAndJson<'rc>>, RenderError> {
    match h.param(idx) {
        Some(param) if param.is_value_missing() => Err(RenderErrorReason::Other(format!(
            "{}: no such field {:?}",
            h.name(),
            param.relative_path().map_or("", String::as_str)
        ))
        .into()),
        other => Ok(other),
    }
}

/// `{{jsonEscape value}}`
fn json_escape_helper(
    h: &Helper,
    _: &Handlebars,
    _: &HbsContext,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let escaped = param(h, 0)?
        .map(|param| json_escape(param.value()))
        .unwrap_or_default();
    out.write(&escaped)?;
    Ok(())
}

/// `{{replace value "old" "new"}}`
fn replace_helper(
    h: &Helper,
    _: &Handlebars,
    _: &HbsContext,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let arg = |idx: usize| -> Result<String, RenderError> {
        Ok(param(h, idx)?
            .map(|param| display_value(param.value()))
            .unwrap_or_default())
    };
    let (value, old, new) = (arg(0)?, arg(1)?, arg(2)?);
    out.write(&value.replace(&old, &new))?;
    Ok(())
}

/// `{{lookup map "key"}}`
///
/// Replaces the built-in `lookup`, which fails on a missing key in strict
/// mode. The map itself must exist; an absent key renders empty.
fn lookup_helper(
    h: &Helper,
    _: &Handlebars,
    _: &HbsContext,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let (Some(collection), Some(key)) = (param(h, 0)?, param(h, 1)?) else {
        return Err(RenderErrorReason::Other("lookup needs a map and a key".to_string()).into());
    };

    let value = match (collection.value(), key.value()) {
        (JsonValue::Object(map), JsonValue::String(k)) => map.get(k),
        (JsonValue::Array(items), JsonValue::Number(n)) => n
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| items.get(i)),
        _ => None,
    };

    out.write(&value.map(display_value).unwrap_or_default())?;
    Ok(())
}

/// Create a Handlebars registry configured for notification templates.
#[must_use]
pub fn create_handlebars() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();

    handlebars.set_strict_mode(true);
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars.register_helper("replace", Box::new(replace_helper));
    handlebars.register_helper("jsonEscape", Box::new(json_escape_helper));
    handlebars.register_helper("lookup", Box::new(lookup_helper));

    handlebars
}

/// Build fields as exposed under `Build` in templates.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildView<'a> {
    pub id: &'a str,
    pub status: &'a BuildStatus,
    pub log_url: &'a str,
    pub project_id: &'a str,
    pub substitutions: &'a HashMap<String, String>,
}

/// The object templates are rendered against.
///
/// `Build` and `Params` carry the full view. The lower-case top-level keys are
/// shorthands for the build fields, so `{{status}}` and `{{Build.Status}}`
/// render the same value.
#[derive(Debug, Serialize)]
pub struct TemplateView<'a> {
    #[serde(rename = "Build")]
    pub build: BuildView<'a>,
    #[serde(rename = "Params")]
    pub params: &'a HashMap<String, String>,
    pub id: &'a str,
    pub status: &'a BuildStatus,
    #[serde(rename = "logUrl")]
    pub log_url: &'a str,
    #[serde(rename = "projectId")]
    pub project_id: &'a str,
    pub substitutions: &'a HashMap<String, String>,
}

impl<'a> TemplateView<'a> {
    #[must_use]
    pub fn new(build: &'a Build, params: &'a HashMap<String, String>) -> Self {
        Self {
            build: BuildView {
                id: &build.id,
                status: &build.status,
                log_url: &build.log_url,
                project_id: &build.project_id,
                substitutions: &build.substitutions,
            },
            params,
            id: &build.id,
            status: &build.status,
            log_url: &build.log_url,
            project_id: &build.project_id,
            substitutions: &build.substitutions,
        }
    }
}
