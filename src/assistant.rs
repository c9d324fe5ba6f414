//! Orchestrates model calls against the notebook, chat log, and history.
//!
//! The assistant owns no note or chat state. Each operation builds a prompt
//! from the collaborators it is handed, calls the model, parses the response,
//! and applies the result back. Model failures degrade to empty responses
//! plus a user-facing notification; they never abort the operation.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use time::OffsetDateTime;

use crate::chat::ChatLog;
use crate::gemini::{ModelClient, ModelError, ModelResponse};
use crate::history::PromptHistory;
use crate::models::{Author, NoteId, ProcessedResponse, PromptCall};
use crate::notebook::Notebook;
use crate::prompts::{
    make_chat_prompt_from_relevant_notes, make_relevant_notes_prompt, make_tag_summary_prompt,
    make_tags_from_content_prompt, make_title_from_content_prompt,
    parse_relevant_notes_response, parse_tag_summary_response, parse_tags_from_content_response,
    Prompt,
};
use crate::tags::{extract_tags_from_text, strip_leading_hash};

const UNSURE_RESPONSE_TEXT: &str = "Sorry, I'm not sure how to answer that.";

/// Pause between model calls in batch operations, to stay under rate limits.
const DEFAULT_PACING: Duration = Duration::from_millis(1100);

/// Receives user-facing messages about degraded operations.
///
/// The CLI prints these to stderr; tests collect them.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Notifier that prints to stderr.
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }
}

/// Model-backed operations over the notebook and chat.
///
/// Collaborators are injected per call so the assistant itself stays
/// stateless apart from its client, notifier, and pacing.
pub struct Assistant {
    client: Arc<dyn ModelClient>,
    notifier: Arc<dyn Notifier>,
    pacing: Duration,
}

impl Assistant {
    pub fn new(client: Arc<dyn ModelClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            notifier,
            pacing: DEFAULT_PACING,
        }
    }

    /// Overrides the inter-call pause used by batch operations.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Calls the model; on failure, notifies the user and returns an empty
    /// response so the calling operation proceeds with what it has.
    fn predict_or_empty(&self, prompt: &Prompt) -> ModelResponse {
        let stop_tokens = vec![prompt.stop_token.clone()];
        match self.client.predict(&prompt.text, &stop_tokens) {
            Ok(response) => response,
            Err(ModelError::Quota) => {
                self.notifier.notify("API quota exceeded - try again later.");
                ModelResponse::default()
            }
            Err(error) => {
                self.notifier.notify(&format!("Model call failed: {error}"));
                ModelResponse::default()
            }
        }
    }

    fn log_call(
        &self,
        history: &mut PromptHistory,
        prompt: &Prompt,
        response: &str,
        processed: ProcessedResponse,
        name: &str,
    ) -> Result<()> {
        history.log(PromptCall {
            prompt: prompt.text.clone(),
            response: response.to_string(),
            processed_response: Some(processed),
            stop_tokens: vec![prompt.stop_token.clone()],
            timestamp: OffsetDateTime::now_utc(),
            prompt_name: name.to_string(),
        })
    }

    /// Turns a chat message into a note.
    ///
    /// If the body already carries tags it is stored as-is. Otherwise a title
    /// is generated for bodies longer than 40 characters, tags are generated
    /// from the content, and the note is stored with the tags appended.
    pub fn create_note_from_chat(
        &self,
        notebook: &mut Notebook,
        history: &mut PromptHistory,
        chat_body: &str,
    ) -> Result<NoteId> {
        let initial_tags = extract_tags_from_text(chat_body).tags;
        if !initial_tags.is_empty() {
            return notebook.add_note(chat_body, Author::System, "");
        }

        let mut title = String::new();
        if chat_body.chars().count() > 40 {
            let title_prompt = make_title_from_content_prompt(chat_body);
            let title_response = self.predict_or_empty(&title_prompt);
            title = title_response.text.trim().to_string();

            self.log_call(
                history,
                &title_prompt,
                &title_response.text,
                ProcessedResponse::from(title.clone()),
                "title from content - create note from chat",
            )?;
        }

        let prompt = make_tags_from_content_prompt(chat_body, &notebook.tags(), "");
        let response = self.predict_or_empty(&prompt);
        let created_tags = parse_tags_from_content_response(&response.text);

        self.log_call(
            history,
            &prompt,
            &response.text,
            ProcessedResponse::from(created_tags.clone()),
            "tags from content - create note from chat",
        )?;

        let body = format!("{chat_body}\n{}", created_tags.join(" "));
        notebook.add_note(&body, Author::System, &title)
    }

    /// Generates and appends tags for an existing note. Unknown IDs are a
    /// no-op.
    pub fn add_tags_to_note(
        &self,
        notebook: &mut Notebook,
        history: &mut PromptHistory,
        id: &NoteId,
    ) -> Result<()> {
        let Some(note) = notebook.get_note(id) else {
            return Ok(());
        };
        let (markdown, note_title) = (note.markdown.clone(), note.title.clone());

        let prompt = make_tags_from_content_prompt(&markdown, &notebook.tags(), &note_title);
        let response = self.predict_or_empty(&prompt);
        let generated_tags = parse_tags_from_content_response(&response.text);

        self.log_call(
            history,
            &prompt,
            &response.text,
            ProcessedResponse::from(generated_tags.clone()),
            "tags from content - add tags to note",
        )?;

        notebook.add_tags_to_note(id, &generated_tags)
    }

    /// Adds a user-authored note, generating tags first when the body has
    /// none of its own.
    pub fn add_note_with_generated_tags(
        &self,
        notebook: &mut Notebook,
        history: &mut PromptHistory,
        body: &str,
        title: &str,
    ) -> Result<NoteId> {
        let existing_tags = extract_tags_from_text(body).tags;
        if !existing_tags.is_empty() {
            return notebook.add_note(body, Author::User, title);
        }

        let prompt = make_tags_from_content_prompt(body, &notebook.tags(), title);
        let response = self.predict_or_empty(&prompt);
        let generated_tags = parse_tags_from_content_response(&response.text);

        self.log_call(
            history,
            &prompt,
            &response.text,
            ProcessedResponse::from(generated_tags.clone()),
            "tags from content - add note with generated tags",
        )?;

        let body = format!("{body}\n{}", generated_tags.join(" "));
        notebook.add_note(&body, Author::User, title)
    }

    /// Regenerates the summary for a tag (given without its leading `#`).
    ///
    /// The stored summary is invalidated to empty first, so a failed call
    /// never leaves a stale summary behind.
    pub fn update_tag_summary(
        &self,
        notebook: &mut Notebook,
        history: &mut PromptHistory,
        tag: &str,
    ) -> Result<()> {
        let tag = strip_leading_hash(tag);
        notebook.set_tag_summary(tag, "")?;

        let hashed = format!("#{tag}");
        let mut note_ids = notebook.note_ids_with_tag(&hashed);
        note_ids.extend(notebook.note_ids_with_category(&hashed));
        let notes: Vec<_> = note_ids
            .iter()
            .filter_map(|id| notebook.get_note(id))
            .cloned()
            .collect();

        let prompt = make_tag_summary_prompt(&notes, tag);
        let response = self.predict_or_empty(&prompt);
        let summary = parse_tag_summary_response(&response.text);

        self.log_call(
            history,
            &prompt,
            &response.text,
            ProcessedResponse::from(summary.clone()),
            "tag summary - get tag summary",
        )?;

        notebook.set_tag_summary(tag, &summary)
    }

    /// Answers the latest user message grounded in the notebook.
    ///
    /// First asks the model which notes are relevant, then asks it to answer
    /// using those notes (or the tag summaries when none were picked). The
    /// answer is appended as a system message referencing the chosen notes;
    /// an empty answer becomes a fixed "not sure" response.
    pub fn run_chat_with_relevant_notes(
        &self,
        notebook: &mut Notebook,
        chat_log: &mut ChatLog,
        history: &mut PromptHistory,
    ) -> Result<()> {
        let chats = chat_log.messages().to_vec();

        let prompt = make_relevant_notes_prompt(&chats, notebook.notes());
        let notes_response = self.predict_or_empty(&prompt);
        let relevant_ids = parse_relevant_notes_response(&notes_response.text);

        self.log_call(
            history,
            &prompt,
            &notes_response.text,
            ProcessedResponse::from(relevant_ids.clone()),
            "notes - get relevant notes for chat prompt",
        )?;

        // Stale or hallucinated IDs are dropped silently.
        let mut note_ids = Vec::new();
        let mut note_texts = Vec::new();
        for raw_id in &relevant_ids {
            let id = NoteId::from_string(raw_id.clone());
            if let Some(note) = notebook.get_note(&id) {
                note_texts.push(note.markdown.clone());
                note_ids.push(id);
            }
        }

        let chat_prompt =
            make_chat_prompt_from_relevant_notes(&chats, &note_texts, notebook.tag_summary_map());
        let chat_response = self.predict_or_empty(&chat_prompt);

        self.log_call(
            history,
            &chat_prompt,
            &chat_response.text,
            ProcessedResponse::from(chat_response.text.clone()),
            "chat - chat with relevant notes",
        )?;

        let body = if chat_response.text.is_empty() {
            UNSURE_RESPONSE_TEXT.to_string()
        } else {
            chat_response.text.clone()
        };
        chat_log.add_message(Author::System, &body, Some(note_ids))?;
        Ok(())
    }

    /// Generates tags for every note, pausing between calls.
    ///
    /// With `skip_tagged`, notes that already carry tags are left alone.
    pub fn tag_all_notes(
        &self,
        notebook: &mut Notebook,
        history: &mut PromptHistory,
        skip_tagged: bool,
    ) -> Result<()> {
        let ids: Vec<NoteId> = notebook
            .notes()
            .iter()
            .filter(|note| !(skip_tagged && !note.tags.is_empty()))
            .map(|note| note.id.clone())
            .collect();

        for (position, id) in ids.iter().enumerate() {
            if position > 0 {
                thread::sleep(self.pacing);
            }
            self.add_tags_to_note(notebook, history, id)?;
        }
        Ok(())
    }

    /// Regenerates the summary for every tag, pausing between calls.
    ///
    /// With `skip_summarized`, tags that already have a summary are left
    /// alone.
    pub fn summarize_all_tags(
        &self,
        notebook: &mut Notebook,
        history: &mut PromptHistory,
        skip_summarized: bool,
    ) -> Result<()> {
        let tags: Vec<String> = notebook
            .tags()
            .iter()
            .map(|tag| strip_leading_hash(tag).to_string())
            .filter(|tag| !(skip_summarized && !notebook.tag_summary(tag).is_empty()))
            .collect();

        for (position, tag) in tags.iter().enumerate() {
            if position > 0 {
                thread::sleep(self.pacing);
            }
            self.update_tag_summary(notebook, history, tag)?;
        }
        Ok(())
    }
}
