//! Project export/import and foreign-format note conversion.
//!
//! A project round-trips through a single JSON document whose sections are
//! independently optional: importing a document missing a section leaves
//! that part of the project empty rather than failing. Notes can also be
//! imported from Google Keep JSON exports and plain markdown files.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::chat::ChatLog;
use crate::history::PromptHistory;
use crate::markdown::parse_note_content;
use crate::models::{
    Author, ChatMessage, ContentBlock, ListItem, Note, NoteBuilder, ProjectMetadata, PromptCall,
    TagSummaryItem,
};
use crate::notebook::Notebook;
use crate::tags::{extract_tags_from_text, note_markdown};

/// The on-disk project document. Every section is optional on both sides so
/// partial documents import cleanly and older exports stay readable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectExport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<Note>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat: Option<Vec<ChatMessage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_history: Option<Vec<PromptCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_summaries: Option<Vec<TagSummaryItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ProjectMetadata>,
}

/// Snapshots the whole project into an export document.
pub fn export_project(
    notebook: &Notebook,
    chat_log: &ChatLog,
    history: &PromptHistory,
    metadata: &ProjectMetadata,
) -> ProjectExport {
    ProjectExport {
        notes: Some(notebook.notes().to_vec()),
        chat: Some(chat_log.messages().to_vec()),
        prompt_history: Some(history.calls().to_vec()),
        pinned_tags: Some(notebook.index().pinned_tags()),
        tag_summaries: Some(notebook.tag_summaries_list()),
        metadata: Some(metadata.clone()),
    }
}

/// Replaces the current project's content with the document's.
///
/// Existing content is cleared first, then each present section is loaded;
/// absent sections stay empty. Returns the document's metadata (if any) so
/// the caller can merge it while keeping the current project ID.
pub fn import_project(
    document: ProjectExport,
    notebook: &mut Notebook,
    chat_log: &mut ChatLog,
    history: &mut PromptHistory,
) -> Result<Option<ProjectMetadata>> {
    notebook.restore(
        document.notes.unwrap_or_default(),
        &document.pinned_tags.unwrap_or_default(),
        document.tag_summaries.unwrap_or_default(),
    )?;
    chat_log.restore(document.chat.unwrap_or_default())?;
    history.restore(document.prompt_history.unwrap_or_default())?;

    Ok(document.metadata)
}

/// Merges the document's notes into the current project, keeping everything
/// else. Fails when the document has no `notes` section.
pub fn import_notes(document: ProjectExport, notebook: &mut Notebook) -> Result<()> {
    let notes = document
        .notes
        .ok_or_else(|| anyhow::anyhow!("import document has no 'notes' field"))?;
    notebook.import_notes(notes)
}

/// Builds a note from raw markdown, extracting tags and deriving the body.
pub fn convert_markdown_to_note(raw_markdown: &str, title: &str, date: OffsetDateTime) -> Note {
    let extraction = extract_tags_from_text(raw_markdown);
    let body = parse_note_content(&extraction.text);
    let markdown = note_markdown(&extraction.text, &extraction.tags);

    NoteBuilder::new()
        .author(Author::User)
        .title(title)
        .markdown(markdown)
        .tags(extraction.tags)
        .body(body)
        .date_created(date)
        .date_modified(date)
        .build()
}

/// One checklist entry in a Keep list note.
#[derive(Debug, Clone, Deserialize)]
pub struct KeepListItem {
    #[serde(default)]
    pub text: String,
    #[serde(rename = "isChecked", default)]
    pub is_checked: bool,
}

/// A single note from a Google Keep JSON export. Text notes carry
/// `textContent`; checklist notes carry `listContent` instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeepNote {
    #[serde(default)]
    pub title: String,
    pub text_content: Option<String>,
    pub list_content: Option<Vec<KeepListItem>>,
    #[serde(default)]
    pub created_timestamp_usec: i64,
    #[serde(default)]
    pub user_edited_timestamp_usec: i64,
}

fn date_from_usec(usec: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(usec) * 1000)
        .unwrap_or_else(|_| OffsetDateTime::UNIX_EPOCH)
}

/// Converts a Keep note into a native note.
///
/// Text notes go through tag extraction like any other raw content. List
/// notes become a single checklist block whose markdown uses `- [ ]` / `- [x]`
/// rows; Keep lists carry no tags.
pub fn convert_keep_to_note(keep: KeepNote) -> Note {
    let date_created = date_from_usec(keep.created_timestamp_usec);
    let date_modified = date_from_usec(keep.user_edited_timestamp_usec);

    let builder = NoteBuilder::new()
        .author(Author::User)
        .title(keep.title)
        .date_created(date_created)
        .date_modified(date_modified);

    if let Some(text) = keep.text_content {
        let extraction = extract_tags_from_text(&text);
        let body = parse_note_content(&extraction.text);
        let markdown = note_markdown(&extraction.text, &extraction.tags);

        builder
            .markdown(markdown)
            .tags(extraction.tags)
            .body(body)
            .build()
    } else {
        let items = keep.list_content.unwrap_or_default();
        let markdown = items
            .iter()
            .map(|item| {
                format!(
                    "- [{}] {}",
                    if item.is_checked { "x" } else { "" },
                    item.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let list = items
            .into_iter()
            .map(|item| ListItem {
                text: item.text,
                is_checked: item.is_checked,
            })
            .collect();

        builder
            .markdown(markdown)
            .body(vec![ContentBlock::list(list)])
            .build()
    }
}
