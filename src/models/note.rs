use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{Author, ContentBlock, NoteId};

/// A note with its markdown source and derived structure.
///
/// Notes are the primary unit of capture in the system. `markdown` is the
/// canonical source: it always holds the tag-free text followed by the tags,
/// and `tags`/`body` are re-derived from it on every edit. No code path
/// mutates `tags` or `body` without updating `markdown` consistently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Opaque unique identifier, generated on creation.
    pub id: NoteId,
    /// Who created this note.
    pub author: Author,
    /// Optional display title.
    #[serde(default)]
    pub title: String,
    /// Canonical markdown source (tag-free text, then tags).
    pub markdown: String,
    /// Tags extracted from `markdown`, in encounter order, `#`-prefixed.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Content blocks derived from the tag-free text.
    #[serde(default)]
    pub body: Vec<ContentBlock>,
    /// When this note was created.
    #[serde(rename = "dateCreated", with = "time::serde::rfc3339")]
    pub date_created: OffsetDateTime,
    /// When this note was last modified.
    #[serde(rename = "dateModified", with = "time::serde::rfc3339")]
    pub date_modified: OffsetDateTime,
}

/// Builder for constructing `Note` instances with optional fields.
///
/// # Examples
///
/// ```
/// use jot::{Author, NoteBuilder, NoteId};
///
/// let note = NoteBuilder::new()
///     .id(NoteId::from_string("a"))
///     .author(Author::User)
///     .markdown("Buy milk\n\n#groceries")
///     .tags(vec!["#groceries".to_string()])
///     .build();
///
/// assert_eq!(note.tags, ["#groceries"]);
/// assert!(note.title.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct NoteBuilder {
    id: Option<NoteId>,
    author: Option<Author>,
    title: Option<String>,
    markdown: Option<String>,
    tags: Option<Vec<String>>,
    body: Option<Vec<ContentBlock>>,
    date_created: Option<OffsetDateTime>,
    date_modified: Option<OffsetDateTime>,
}

impl NoteBuilder {
    /// Creates a new `NoteBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the note ID. A fresh ID is generated when not set.
    pub fn id(mut self, id: NoteId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the note author.
    pub fn author(mut self, author: Author) -> Self {
        self.author = Some(author);
        self
    }

    /// Sets the note title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the canonical markdown source.
    pub fn markdown(mut self, markdown: impl Into<String>) -> Self {
        self.markdown = Some(markdown.into());
        self
    }

    /// Sets the extracted tags.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Sets the derived content blocks.
    pub fn body(mut self, body: Vec<ContentBlock>) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the created timestamp.
    pub fn date_created(mut self, date: OffsetDateTime) -> Self {
        self.date_created = Some(date);
        self
    }

    /// Sets the modified timestamp.
    pub fn date_modified(mut self, date: OffsetDateTime) -> Self {
        self.date_modified = Some(date);
        self
    }

    /// Builds the `Note`, using defaults for unset optional fields.
    pub fn build(self) -> Note {
        let now = OffsetDateTime::now_utc();
        Note {
            id: self.id.unwrap_or_else(NoteId::generate),
            author: self.author.unwrap_or(Author::User),
            title: self.title.unwrap_or_default(),
            markdown: self.markdown.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
            body: self.body.unwrap_or_default(),
            date_created: self.date_created.unwrap_or(now),
            date_modified: self.date_modified.unwrap_or(now),
        }
    }
}
