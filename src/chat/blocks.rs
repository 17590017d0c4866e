//! Typed subset of the platform's block layout language. Only the shapes the
//! bot actually posts (and scans for) are modeled; anything else deserializes
//! to [`Block::Unknown`] and is carried through untouched.

use serde::{Deserialize, Serialize};

/// One layout block of a message or modal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Large header line.
    Header {
        /// Stable identifier used as a structural marker.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
        /// Header text (plain text only).
        text: TextObject,
    },
    /// Free-form text section.
    Section {
        /// Stable identifier used as a structural marker.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
        /// Section body.
        text: TextObject,
        /// Optional trailing button.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        accessory: Option<ButtonElement>,
    },
    /// Row of interactive buttons.
    Actions {
        /// Stable identifier used as a structural marker.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
        /// Buttons in display order.
        elements: Vec<ButtonElement>,
    },
    /// Small-print footer line.
    Context {
        /// Stable identifier used as a structural marker.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
        /// Footer text fragments.
        elements: Vec<TextObject>,
    },
    /// Text entry field (modals only).
    Input {
        /// Stable identifier; the submission state is keyed by it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
        /// Field label.
        label: TextObject,
        /// The input element itself.
        element: InputElement,
    },
    /// Horizontal rule.
    Divider,
    /// Any block type this bot does not model.
    #[serde(other)]
    Unknown,
}

/// Text payload of a block, either markdown-flavored or plain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    /// Markdown-flavored text.
    Mrkdwn {
        /// The text body.
        text: String,
    },
    /// Plain text.
    PlainText {
        /// The text body.
        text: String,
        /// Whether emoji shortcodes are expanded.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        emoji: Option<bool>,
    },
}

impl TextObject {
    /// Markdown-flavored text object.
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        TextObject::Mrkdwn { text: text.into() }
    }

    /// Plain text object.
    pub fn plain(text: impl Into<String>) -> Self {
        TextObject::PlainText {
            text: text.into(),
            emoji: Some(true),
        }
    }
}

/// An interactive button carried inside a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonElement {
    /// Always `"button"` on the wire.
    #[serde(rename = "type")]
    pub element_type: String,
    /// Identifier dispatched back on press.
    pub action_id: String,
    /// Button label.
    pub text: TextObject,
    /// Opaque payload round-tripped through the press callback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Visual emphasis (`primary` / `danger`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl ButtonElement {
    /// A plain button with the given action id and label.
    pub fn new(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            element_type: "button".into(),
            action_id: action_id.into(),
            text: TextObject::plain(label),
            value: None,
            style: None,
        }
    }

    /// Attach a callback payload.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the visual emphasis.
    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

/// A plain-text entry element for modal input blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputElement {
    /// Always `"plain_text_input"` on the wire.
    #[serde(rename = "type")]
    pub element_type: String,
    /// Identifier the submitted value is keyed by.
    pub action_id: String,
    /// Pre-filled value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<String>,
    /// Whether the field accepts multiple lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiline: Option<bool>,
}

impl InputElement {
    /// A single-line text input.
    pub fn new(action_id: impl Into<String>) -> Self {
        Self {
            element_type: "plain_text_input".into(),
            action_id: action_id.into(),
            initial_value: None,
            multiline: None,
        }
    }

    /// Pre-fill the field.
    pub fn initial_value(mut self, value: impl Into<String>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    /// Allow multi-line entry.
    pub fn multiline(mut self) -> Self {
        self.multiline = Some(true);
        self
    }
}

/// A modal view opened in response to an interaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalView {
    /// Always `"modal"` on the wire.
    #[serde(rename = "type")]
    pub view_type: String,
    /// Identifier dispatched back on submission.
    pub callback_id: String,
    /// Opaque payload round-tripped through the submission callback.
    pub private_metadata: String,
    /// Modal title.
    pub title: TextObject,
    /// Submit button label.
    pub submit: TextObject,
    /// Close button label.
    pub close: TextObject,
    /// Modal body.
    pub blocks: Vec<Block>,
}

impl ModalView {
    /// A modal with the usual Submit/Cancel buttons.
    pub fn new(callback_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            view_type: "modal".into(),
            callback_id: callback_id.into(),
            private_metadata: String::new(),
            title: TextObject::plain(title),
            submit: TextObject::plain("Submit"),
            close: TextObject::plain("Cancel"),
            blocks: Vec::new(),
        }
    }

    /// Attach the round-tripped payload.
    pub fn private_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.private_metadata = metadata.into();
        self
    }

    /// Append a block to the modal body.
    pub fn block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }
}

/// Markdown section block.
pub fn section(text: impl Into<String>) -> Block {
    Block::Section {
        block_id: None,
        text: TextObject::mrkdwn(text),
        accessory: None,
    }
}

/// Header block carrying a structural marker id.
pub fn marked_header(block_id: impl Into<String>, text: impl Into<String>) -> Block {
    Block::Header {
        block_id: Some(block_id.into()),
        text: TextObject::plain(text),
    }
}

/// Button row block.
pub fn actions(elements: Vec<ButtonElement>) -> Block {
    Block::Actions {
        block_id: None,
        elements,
    }
}

/// Small-print footer block.
pub fn context(text: impl Into<String>) -> Block {
    Block::Context {
        block_id: None,
        elements: vec![TextObject::mrkdwn(text)],
    }
}

/// Whether any block in `blocks` carries the given marker id.
pub fn has_marker(blocks: &[Block], marker: &str) -> bool {
    blocks.iter().any(|block| {
        let id = match block {
            Block::Header { block_id, .. }
            | Block::Section { block_id, .. }
            | Block::Actions { block_id, .. }
            | Block::Context { block_id, .. }
            | Block::Input { block_id, .. } => block_id.as_deref(),
            Block::Divider | Block::Unknown => None,
        };
        id == Some(marker)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_serialization_is_tagged() {
        let block = section("hello *world*");
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "section");
        assert_eq!(json["text"]["type"], "mrkdwn");
        assert_eq!(json["text"]["text"], "hello *world*");
    }

    #[test]
    fn unknown_block_types_deserialize_without_error() {
        let json = r#"[{"type":"rich_text","elements":[]},{"type":"divider"}]"#;
        let blocks: Vec<Block> = serde_json::from_str(json).unwrap();
        assert_eq!(blocks, vec![Block::Unknown, Block::Divider]);
    }

    #[test]
    fn marker_detection_matches_block_id_only() {
        let blocks = vec![
            section("scoreboard_header"),
            marked_header("scoreboard_header", "Scoreboard"),
        ];
        assert!(has_marker(&blocks, "scoreboard_header"));
        assert!(!has_marker(&blocks[..1], "scoreboard_header"));
    }
}
