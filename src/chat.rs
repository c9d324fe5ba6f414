//! Chat session state: an ordered transcript of user/system exchanges.

use std::sync::Arc;

use anyhow::Result;
use time::OffsetDateTime;

use crate::models::{Author, ChatId, ChatMessage, NoteId};
use crate::storage::ProjectStore;

/// The ordered chat transcript for a project.
///
/// Messages alternate between user and system authors; system messages may
/// reference the notes used to ground the answer, and user messages may link
/// a note later created from them. Every mutation persists through the store.
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    store: Arc<dyn ProjectStore>,
}

impl ChatLog {
    /// Creates an empty chat log persisting through the given store.
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self {
            messages: Vec::new(),
            store,
        }
    }

    fn save(&self) -> Result<()> {
        self.store.save_chat(&self.messages)
    }

    /// The transcript in chronological order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Appends a message with a fresh ID and returns that ID.
    pub fn add_message(
        &mut self,
        author: Author,
        body: &str,
        referenced_note_ids: Option<Vec<NoteId>>,
    ) -> Result<ChatId> {
        let id = ChatId::generate();
        self.messages.push(ChatMessage {
            id: id.clone(),
            author,
            body: body.to_string(),
            date_created: OffsetDateTime::now_utc(),
            referenced_note_ids,
            created_note_id: None,
        });
        self.save()?;
        Ok(id)
    }

    /// Removes the message with the given ID and everything after it, so a
    /// question and its answer disappear together. Unknown IDs are a no-op.
    pub fn remove_exchanges(&mut self, from: &ChatId) -> Result<()> {
        if let Some(position) = self.messages.iter().position(|m| &m.id == from) {
            self.messages.truncate(position);
            self.save()?;
        }
        Ok(())
    }

    /// Links a created note back to the user message that produced it.
    /// Unknown IDs are a no-op.
    pub fn add_created_note_id(&mut self, message_id: &ChatId, note_id: &NoteId) -> Result<()> {
        if let Some(message) = self.messages.iter_mut().find(|m| &m.id == message_id) {
            message.created_note_id = Some(note_id.clone());
            self.save()?;
        }
        Ok(())
    }

    /// Looks up a message by ID.
    pub fn get_message(&self, id: &ChatId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// Replaces the transcript (load path; does not persist by itself).
    pub fn set_messages(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }

    /// Replaces the transcript and persists it.
    pub fn restore(&mut self, messages: Vec<ChatMessage>) -> Result<()> {
        self.messages = messages;
        self.save()
    }

    /// Clears the transcript.
    pub fn clear(&mut self) -> Result<()> {
        self.messages.clear();
        self.save()
    }
}
