//! Turns a build event into a Slack webhook message.

use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error};

use crate::blocks::{self, Block};
use crate::error::{NotifyError, Result};
use crate::events::Build;
use crate::templates::{self, TemplateView, BLOCK_TEMPLATE, TEXT_TEMPLATE};

/// How much of a rendered block template to keep when it fails to parse.
const SNIPPET_CHARS: usize = 500;

/// Payload posted to a Slack incoming webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub attachments: Vec<Attachment>,
}

/// A colored attachment holding the rendered blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub color: String,
    pub blocks: Vec<Block>,
}

/// Compiled block template plus the optional text template.
///
/// Immutable once built, so one renderer can serve concurrent events.
pub struct MessageRenderer {
    handlebars: Handlebars<'static>,
    has_text: bool,
}

impl MessageRenderer {
    /// Compile the block template and, if given, the text template.
    ///
    /// An empty text template counts as not configured.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::TemplateParse`] naming the template that failed
    /// to compile.
    pub fn new(block_template: &str, text_template: Option<&str>) -> Result<Self> {
        let mut handlebars = templates::create_handlebars();

        handlebars
            .register_template_string(BLOCK_TEMPLATE, block_template)
            .map_err(|e| NotifyError::TemplateParse {
                name: "blockkit",
                source: Box::new(e),
            })?;

        let text_template = text_template.filter(|t| !t.is_empty());
        if let Some(text_template) = text_template {
            handlebars
                .register_template_string(TEXT_TEMPLATE, text_template)
                .map_err(|e| NotifyError::TemplateParse {
                    name: "message",
                    source: Box::new(e),
                })?;
        }

        Ok(Self {
            handlebars,
            has_text: text_template.is_some(),
        })
    }

    /// Whether a text template is configured.
    #[must_use]
    pub const fn has_text_template(&self) -> bool {
        self.has_text
    }

    /// Render the message for a build.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::TemplateRender`] if either template fails to
    /// execute and [`NotifyError::BlockParse`] if the block template does not
    /// render to a valid block array.
    pub fn render(&self, build: &Build, params: &HashMap<String, String>) -> Result<WebhookMessage> {
        // The log URL reaches templates as-is: it is not checked for being a
        // valid URL and no UTM parameters are added, so an odd logUrl never
        // fails the event.
        let view = TemplateView::new(build, params);

        let rendered = self
            .handlebars
            .render(BLOCK_TEMPLATE, &view)
            .map_err(|e| NotifyError::TemplateRender {
                name: "blockkit",
                source: Box::new(e),
            })?;

        let blocks = blocks::parse_blocks(&rendered).map_err(|e| {
            let snippet = truncate(&rendered, SNIPPET_CHARS);
            error!(
                build_id = %build.id,
                error = %e,
                "failed to unmarshal templating JSON. JSON (first {SNIPPET_CHARS} chars): {snippet}"
            );
            NotifyError::BlockParse { snippet, source: e }
        })?;

        let text = if self.has_text {
            let text = self
                .handlebars
                .render(TEXT_TEMPLATE, &view)
                .map_err(|e| NotifyError::TemplateRender {
                    name: "message",
                    source: Box::new(e),
                })?;
            Some(text)
        } else {
            None
        };

        debug!(
            build_id = %build.id,
            block_count = blocks.len(),
            has_text = text.is_some(),
            "Rendered message"
        );

        Ok(WebhookMessage {
            text,
            attachments: vec![Attachment {
                color: build.color().to_string(),
                blocks,
            }],
        })
    }
}

/// Keep at most `max` characters, marking the cut with `...`.
fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{
        BlockElement, ButtonElement, DividerBlock, Extra, SectionBlock, TextObject,
    };
    use crate::events::BuildStatus;

    const BLOCK_KIT_TEMPLATE: &str = r#"[
        {
          "type": "section",
          "text": {
            "type": "mrkdwn",
            "text": "Build {{Build.Substitutions._GOOGLE_FUNCTION_TARGET}} Status: {{Build.Status}}"
          }
        },
        {
          "type": "divider"
        },
        {
          "type": "section",
          "text": {
            "type": "mrkdwn",
            "text": "View Build Logs"
          },
          "accessory": {
            "type": "button",
            "text": {
              "type": "plain_text",
              "text": "Logs"
            },
            "value": "click_me_123",
            "url": "{{replace Build.LogUrl "\"" "'"}}",
            "action_id": "button-action"
          }
        }
    ]"#;

    fn hello_build() -> Build {
        Build::from_json(
            r#"{
                "id": "111222333-4455-6677-8899-fa12345678",
                "status": "SUCCESS",
                "projectId": "hello-world-123",
                "logUrl": "https://some.example.com/log/url?foo=bar\"",
                "substitutions": {"_GOOGLE_FUNCTION_TARGET": "helloHttp"}
            }"#,
        )
        .unwrap()
    }

    fn section_text(message: &WebhookMessage, idx: usize) -> &str {
        match &message.attachments[0].blocks[idx] {
            Block::Section(SectionBlock {
                text: Some(text), ..
            }) => &text.text,
            other => panic!("expected section with text, got {other:?}"),
        }
    }

    #[test]
    fn test_write_message() {
        let renderer = MessageRenderer::new(BLOCK_KIT_TEMPLATE, None).unwrap();
        let got = renderer.render(&hello_build(), &HashMap::new()).unwrap();

        let want = WebhookMessage {
            text: None,
            attachments: vec![Attachment {
                color: "#22bb33".to_string(),
                blocks: vec![
                    Block::Section(SectionBlock {
                        text: Some(TextObject::mrkdwn("Build helloHttp Status: SUCCESS")),
                        ..SectionBlock::default()
                    }),
                    Block::Divider(DividerBlock::default()),
                    Block::Section(SectionBlock {
                        text: Some(TextObject::mrkdwn("View Build Logs")),
                        accessory: Some(BlockElement::Button(ButtonElement {
                            text: TextObject::plain("Logs"),
                            action_id: Some("button-action".to_string()),
                            url: Some("https://some.example.com/log/url?foo=bar'".to_string()),
                            value: Some("click_me_123".to_string()),
                            style: None,
                            extra: Extra::new(),
                        })),
                        ..SectionBlock::default()
                    }),
                ],
            }],
        };

        assert_eq!(got, want);
    }

    #[test]
    fn test_write_message_with_text_template() {
        let renderer = MessageRenderer::new(
            BLOCK_KIT_TEMPLATE,
            Some("Build {{status}} for project {{projectId}}"),
        )
        .unwrap();
        let got = renderer.render(&hello_build(), &HashMap::new()).unwrap();

        assert_eq!(
            got.text.as_deref(),
            Some("Build SUCCESS for project hello-world-123")
        );
        assert_eq!(got.attachments.len(), 1);
        assert_eq!(section_text(&got, 0), "Build helloHttp Status: SUCCESS");
    }

    #[test]
    fn test_text_template_with_build_paths() {
        let renderer = MessageRenderer::new(
            "[]",
            Some("Build {{Build.Status}} for project {{Build.ProjectId}}"),
        )
        .unwrap();
        let got = renderer.render(&hello_build(), &HashMap::new()).unwrap();
        assert_eq!(
            got.text.as_deref(),
            Some("Build SUCCESS for project hello-world-123")
        );
    }

    #[test]
    fn test_no_text_template_omits_text() {
        for text_template in [None, Some("")] {
            let renderer = MessageRenderer::new(BLOCK_KIT_TEMPLATE, text_template).unwrap();
            assert!(!renderer.has_text_template());

            let got = renderer.render(&hello_build(), &HashMap::new()).unwrap();
            assert!(got.text.is_none());

            let json = serde_json::to_value(&got).unwrap();
            assert!(json.get("text").is_none());
        }
    }

    #[test]
    fn test_write_message_with_newlines() {
        let build = Build::from_json(
            r#"{
                "id": "b-2",
                "status": "SUCCESS",
                "substitutions": {
                    "_COMMIT_MESSAGE": "This is a commit message\nwith a \"quoted\" newline\nand another one"
                }
            }"#,
        )
        .unwrap();
        let template = r#"[{
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": "*Commit Message:*\n{{jsonEscape Build.Substitutions._COMMIT_MESSAGE}}"
            }
        }]"#;

        let got = MessageRenderer::new(template, None)
            .unwrap()
            .render(&build, &HashMap::new())
            .unwrap();

        assert_eq!(
            section_text(&got, 0),
            "*Commit Message:*\nThis is a commit message\nwith a \"quoted\" newline\nand another one"
        );
    }

    #[test]
    fn test_write_message_with_missing_commit_message() {
        let build = Build::from_json(
            r#"{"id": "b-3", "status": "SUCCESS", "substitutions": {"REPO_NAME": "my-repo"}}"#,
        )
        .unwrap();
        let template = r#"[{
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": "*Commit Message:*\n{{jsonEscape (lookup Build.Substitutions "_COMMIT_MESSAGE")}}|{{lookup Build.Substitutions "_COMMIT_MESSAGE"}}|{{lookup Params "_COMMIT_MESSAGE"}}"
            }
        }]"#;

        let got = MessageRenderer::new(template, None)
            .unwrap()
            .render(&build, &HashMap::new())
            .unwrap();

        assert_eq!(section_text(&got, 0), "*Commit Message:*\n||");
    }

    #[test]
    fn test_color_follows_status() {
        let renderer = MessageRenderer::new("[]", None).unwrap();
        let cases = [
            ("SUCCESS", "#22bb33"),
            ("FAILURE", "#bb2124"),
            ("INTERNAL_ERROR", "#bb2124"),
            ("TIMEOUT", "#bb2124"),
            ("WORKING", "#f0ad4e"),
            ("CANCELLED", "#f0ad4e"),
            ("", "#f0ad4e"),
        ];

        for (status, color) in cases {
            let build = Build {
                status: BuildStatus::from(status),
                ..Build::default()
            };
            let got = renderer.render(&build, &HashMap::new()).unwrap();
            assert_eq!(got.attachments[0].color, color, "status {status:?}");
            assert!(got.attachments[0].blocks.is_empty());
        }
    }

    #[test]
    fn test_params_are_visible() {
        let renderer = MessageRenderer::new(
            r#"[{"type": "header", "text": {"type": "plain_text", "text": "{{Params.buildStatus}} in {{Params.region}}"}}]"#,
            None,
        )
        .unwrap();
        let params = HashMap::from([
            ("buildStatus".to_string(), "SUCCESS".to_string()),
            ("region".to_string(), "us-east1".to_string()),
        ]);

        let got = renderer.render(&hello_build(), &params).unwrap();
        match &got.attachments[0].blocks[0] {
            Block::Header(header) => assert_eq!(header.text.text, "SUCCESS in us-east1"),
            other => panic!("expected header, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_block_json_reports_prefix() {
        let template = format!(
            r#"[{{"type": "section", "text": "{}"}}"#,
            "x".repeat(600)
        );
        let err = MessageRenderer::new(&template, None)
            .unwrap()
            .render(&hello_build(), &HashMap::new())
            .unwrap_err();

        match err {
            NotifyError::BlockParse { snippet, .. } => {
                assert!(snippet.starts_with("[{\"type\": \"section\""));
                assert!(snippet.ends_with("..."));
                assert_eq!(snippet.chars().count(), SNIPPET_CHARS + 3);
            }
            other => panic!("expected BlockParse, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_template_syntax_is_a_parse_error() {
        let err = MessageRenderer::new("[{{#if Build.Status}}]", None)
            .err()
            .unwrap();
        assert!(matches!(err, NotifyError::TemplateParse { name: "blockkit", .. }));
        assert!(err.is_config_error());

        let err = MessageRenderer::new("[]", Some("{{#each}}"))
            .err()
            .unwrap();
        assert!(matches!(err, NotifyError::TemplateParse { name: "message", .. }));
    }

    #[test]
    fn test_misspelled_field_is_a_render_error() {
        let renderer = MessageRenderer::new(
            r#"[{"type": "section", "text": {"type": "mrkdwn", "text": "S={{Build.Stauts}}|{{Bulid.Id}}"}}]"#,
            None,
        )
        .unwrap();
        let err = renderer.render(&hello_build(), &HashMap::new()).unwrap_err();
        assert!(matches!(err, NotifyError::TemplateRender { name: "blockkit", .. }), "{err}");
        assert!(!err.is_config_error());

        let renderer = MessageRenderer::new("[]", Some("Build {{stauts}}")).unwrap();
        let err = renderer.render(&hello_build(), &HashMap::new()).unwrap_err();
        assert!(matches!(err, NotifyError::TemplateRender { name: "message", .. }), "{err}");
    }

    #[test]
    fn test_missing_map_entry_via_direct_path_is_a_render_error() {
        let renderer = MessageRenderer::new(
            r#"[{"type": "divider", "block_id": "{{Build.Substitutions._NOT_SET}}"}]"#,
            None,
        )
        .unwrap();
        assert!(matches!(
            renderer.render(&hello_build(), &HashMap::new()),
            Err(NotifyError::TemplateRender { .. })
        ));
    }

    #[test]
    fn test_text_render_failure_is_reported() {
        let renderer = MessageRenderer::new("[]", Some("{{> missing_partial}}")).unwrap();
        let err = renderer.render(&hello_build(), &HashMap::new()).unwrap_err();
        assert!(matches!(err, NotifyError::TemplateRender { name: "message", .. }));
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_log_url_is_passed_through() {
        let build = Build {
            log_url: "not a url %zz".to_string(),
            ..hello_build()
        };
        let renderer = MessageRenderer::new(
            r#"[{"type": "section", "text": {"type": "mrkdwn", "text": "{{Build.LogUrl}}"}}]"#,
            None,
        )
        .unwrap();

        let got = renderer.render(&build, &HashMap::new()).unwrap();
        assert_eq!(section_text(&got, 0), "not a url %zz");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 10), "héllo");
        assert_eq!(truncate("héllo", 2), "hé...");
    }
}
