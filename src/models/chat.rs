use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

use super::{ChatId, NoteId};

/// Who created a note or chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    System,
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Author::User => write!(f, "user"),
            Author::System => write!(f, "system"),
        }
    }
}

/// A single message in the chat session.
///
/// Messages are totally ordered by insertion; the array index is the logical
/// timestamp for undo purposes, not the wall-clock `date_created`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: ChatId,
    pub author: Author,
    pub body: String,
    #[serde(rename = "dateCreated", with = "time::serde::rfc3339")]
    pub date_created: OffsetDateTime,
    /// Notes the model retrieved as context for this reply, if any.
    #[serde(
        rename = "referencedNoteIds",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub referenced_note_ids: Option<Vec<NoteId>>,
    /// Back-reference to a note created from this message. May dangle after
    /// the note is deleted; deletion does not cascade here.
    #[serde(
        rename = "createdNoteId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_note_id: Option<NoteId>,
}
