//! Slack Block Kit types.
//!
//! Every documented block type and interactive element is recognised. Fields
//! the notifier reads are typed; everything else on a block, element or text
//! object is carried in its `extra` map, so a template can use any Block Kit
//! attribute (`confirm`, `accessibility_label`, `dispatch_action`, ...) and
//! have it reach Slack unchanged.
//!
//! Parsing is strict: an unknown block or element `type`, or a block missing
//! a required field, is rejected rather than dropped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attributes a struct does not model, kept verbatim.
pub type Extra = Map<String, Value>;

/// A layout block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section(SectionBlock),
    Divider(DividerBlock),
    Header(HeaderBlock),
    Context(ContextBlock),
    Actions(ActionsBlock),
    Image(ImageBlock),
    Input(InputBlock),
    RichText(RichTextBlock),
    File(FileBlock),
    Video(VideoBlock),
    Markdown(MarkdownBlock),
}

/// Parse a rendered template into a list of blocks.
///
/// # Errors
///
/// Returns the JSON error if the input is not an array of known blocks.
pub fn parse_blocks(raw: &str) -> Result<Vec<Block>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Kind of a text object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextType {
    PlainText,
    Mrkdwn,
}

/// A text composition object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    #[serde(rename = "type")]
    pub kind: TextType,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbatim: Option<bool>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl TextObject {
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: TextType::PlainText,
            text: text.into(),
            emoji: None,
            verbatim: None,
            extra: Extra::new(),
        }
    }

    #[must_use]
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            kind: TextType::Mrkdwn,
            text: text.into(),
            emoji: None,
            verbatim: None,
            extra: Extra::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<TextObject>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessory: Option<BlockElement>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DividerBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderBlock {
    pub text: TextObject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextBlock {
    pub elements: Vec<ContextElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionsBlock {
    pub elements: Vec<BlockElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Image block. `image_url` may be replaced by a `slack_file` reference,
/// which then lives in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub alt_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<TextObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputBlock {
    pub label: TextObject,
    pub element: BlockElement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Rich text block. Its nested sections, lists and quotes are kept as raw
/// JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextBlock {
    pub elements: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Remote file block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileBlock {
    pub external_id: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoBlock {
    pub alt_text: String,
    pub title: TextObject,
    pub thumbnail_url: String,
    pub video_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkdownBlock {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Element allowed inside a context block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContextElement {
    PlainText(ContextText),
    Mrkdwn(ContextText),
    Image(ImageElement),
}

/// Text element of a context block. The element `type` is the enum tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextText {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbatim: Option<bool>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Interactive or image element used as a section accessory, in an actions
/// block, or as the element of an input block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockElement {
    Button(ButtonElement),
    WorkflowButton(ButtonElement),
    Image(ImageElement),
    Overflow(OptionsElement),
    Checkboxes(OptionsElement),
    RadioButtons(OptionsElement),
    StaticSelect(InteractiveElement),
    ExternalSelect(InteractiveElement),
    UsersSelect(InteractiveElement),
    ConversationsSelect(InteractiveElement),
    ChannelsSelect(InteractiveElement),
    MultiStaticSelect(InteractiveElement),
    MultiExternalSelect(InteractiveElement),
    MultiUsersSelect(InteractiveElement),
    MultiConversationsSelect(InteractiveElement),
    MultiChannelsSelect(InteractiveElement),
    Datepicker(InteractiveElement),
    Timepicker(InteractiveElement),
    Datetimepicker(InteractiveElement),
    PlainTextInput(InteractiveElement),
    EmailTextInput(InteractiveElement),
    UrlTextInput(InteractiveElement),
    NumberTextInput(InteractiveElement),
    RichTextInput(InteractiveElement),
    FileInput(InteractiveElement),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonElement {
    pub text: TextObject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub alt_text: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Element built around a fixed list of options: overflow menus, checkboxes
/// and radio buttons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsElement {
    pub options: Vec<OptionObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionObject {
    pub text: TextObject,
    pub value: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Selects, pickers and text inputs. Option lists, initial values and
/// limits stay in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InteractiveElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<TextObject>,
    #[serde(flatten)]
    pub extra: Extra,
}
