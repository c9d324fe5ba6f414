//! Onboarding content for freshly created projects.

use time::OffsetDateTime;

use crate::markdown::parse_note_content;
use crate::models::{Author, ChatId, ChatMessage, Note, NoteBuilder, NoteId, TagSummaryItem};

/// Fixed IDs for the onboarding notes, so the seed chat and tag summary can
/// link back to them.
pub const ONBOARDING_NOTE_INTRO_ID: &str = "a";
pub const ONBOARDING_NOTE_INFO_ID: &str = "b";

const ONBOARDING_TAG: &str = "#notetaking/jot";

/// The starter notes shown in a new project.
pub fn onboarding_notes() -> Vec<Note> {
    let welcome_content = "Jot is a notetaking tool that helps you organize and explore your \
personal notes.\nFeatures include:\n\n- **Hierarchical tagging:** Browse your notes via two \
layers of (auto-generated) tags and summaries\n- **Chat with your notes**: Ask questions about \
your notes, or convert conversations into new notes\n\nFeel free to delete this note and start \
making your own!\n";
    let welcome = NoteBuilder::new()
        .id(NoteId::from_string(ONBOARDING_NOTE_INTRO_ID))
        .author(Author::System)
        .title("Welcome to Jot")
        .markdown(format!("{welcome_content}\n\n{ONBOARDING_TAG}"))
        .body(parse_note_content(welcome_content))
        .tags(vec![ONBOARDING_TAG.to_string()])
        .build();

    let about_content = "Notes live in projects. Each project keeps its own notes, chat \
transcript, and prompt history, and can be exported to a single JSON file.\n";
    let about = NoteBuilder::new()
        .id(NoteId::from_string(ONBOARDING_NOTE_INFO_ID))
        .author(Author::System)
        .title("About Jot")
        .markdown(format!("{about_content}\n\n{ONBOARDING_TAG}"))
        .body(parse_note_content(about_content))
        .tags(vec![ONBOARDING_TAG.to_string()])
        .build();

    vec![welcome, about]
}

/// The greeting message seeding a new project's chat.
pub fn onboarding_chat() -> Vec<ChatMessage> {
    vec![ChatMessage {
        id: ChatId::from_string("chat-a"),
        author: Author::System,
        body: "Hi there! I can help you:\n- Find information in your notes\n- Create new notes \
from our conversation\n\nI can also answer general questions; save the answers as notes to \
reference them later."
            .to_string(),
        date_created: OffsetDateTime::now_utc(),
        referenced_note_ids: None,
        created_note_id: None,
    }]
}

/// A pre-built summary for the onboarding tag, linking back to the seed notes.
pub fn onboarding_tag_summary() -> TagSummaryItem {
    TagSummaryItem {
        tag: "notetaking/jot".to_string(),
        summary: format!(
            "**Jot** keeps your notes organized with hierarchical tags. It features:\n\n\
- Hierarchical tagging [(note)](#/notes/?noteId={ONBOARDING_NOTE_INTRO_ID})\n\
- Chat with your notes [(note)](#/notes/?noteId={ONBOARDING_NOTE_INTRO_ID})\n\n\
Projects and exports are described in [(note)](#/notes/?noteId={ONBOARDING_NOTE_INFO_ID})."
        ),
    }
}
