use serde::{Deserialize, Serialize};

/// A structural unit of note body content.
///
/// Note bodies are a sequence of content blocks: either a run of rendered
/// HTML text or a checkbox list. The `type` field in the serialized form
/// (`"text"` / `"list"`) matches the export document format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    /// Rendered HTML text.
    Text { text: String },
    /// An ordered checkbox list.
    List { list: Vec<ListItem> },
}

impl ContentBlock {
    /// Creates a text block from rendered HTML.
    pub fn text(html: impl Into<String>) -> Self {
        Self::Text { text: html.into() }
    }

    /// Creates a list block from checkbox items.
    pub fn list(items: Vec<ListItem>) -> Self {
        Self::List { list: items }
    }
}

/// A single item in a checkbox list block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub text: String,
    #[serde(rename = "isChecked")]
    pub is_checked: bool,
}

impl ListItem {
    pub fn new(text: impl Into<String>, is_checked: bool) -> Self {
        Self {
            text: text.into(),
            is_checked,
        }
    }
}
