//! Project persistence as a key-value blob store.
//!
//! Each project stores a handful of JSON records (notes, chat, prompt
//! history, pinned tags, tag summaries, metadata) keyed by project ID and
//! record kind. The store has load/save semantics only; write failures are
//! surfaced as errors and never partially applied within a record.

use std::path::Path;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};
use serde::{Serialize, de::DeserializeOwned};

use crate::models::{ChatMessage, Note, ProjectMetadata, PromptCall, TagSummaryItem};

const NOTES_KEY: &str = "notes";
const CHAT_KEY: &str = "chat";
const PROMPT_HISTORY_KEY: &str = "promptHistory";
const PINNED_TAGS_KEY: &str = "pinnedTags";
const TAG_SUMMARY_KEY: &str = "tagSummary";
const METADATA_KEY: &str = "metadata";

const INITIAL_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS records (
    project_id TEXT NOT NULL,
    key        TEXT NOT NULL,
    value      TEXT NOT NULL,
    PRIMARY KEY (project_id, key)
);
";

/// Persistence seam for a single project.
///
/// Loads return `None` when no record exists yet; the composition root
/// substitutes onboarding defaults. Implementations are free to store the
/// blobs however they like.
pub trait ProjectStore {
    fn save_notes(&self, notes: &[Note]) -> Result<()>;
    fn load_notes(&self) -> Result<Option<Vec<Note>>>;

    fn save_chat(&self, chat: &[ChatMessage]) -> Result<()>;
    fn load_chat(&self) -> Result<Option<Vec<ChatMessage>>>;

    fn save_prompt_history(&self, calls: &[PromptCall]) -> Result<()>;
    fn load_prompt_history(&self) -> Result<Option<Vec<PromptCall>>>;

    fn save_pinned_tags(&self, tags: &[String]) -> Result<()>;
    fn load_pinned_tags(&self) -> Result<Option<Vec<String>>>;

    fn save_tag_summaries(&self, items: &[TagSummaryItem]) -> Result<()>;
    fn load_tag_summaries(&self) -> Result<Option<Vec<TagSummaryItem>>>;

    fn save_metadata(&self, metadata: &ProjectMetadata) -> Result<()>;
    fn load_metadata(&self) -> Result<Option<ProjectMetadata>>;
}

/// SQLite-backed [`ProjectStore`], one JSON blob per record kind.
///
/// # Examples
///
/// ```
/// use jot::storage::{ProjectStore, SqliteStore};
///
/// # fn main() -> anyhow::Result<()> {
/// let store = SqliteStore::in_memory("project-1")?;
/// assert!(store.load_notes()?.is_none());
/// # Ok(())
/// # }
/// ```
pub struct SqliteStore {
    conn: Connection,
    project_id: String,
}

impl SqliteStore {
    /// Opens an in-memory store scoped to the given project.
    pub fn in_memory(project_id: impl Into<String>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, project_id)
    }

    /// Opens a file-based store at the given path, scoped to the project.
    ///
    /// Creates the database file if it does not exist. Schema initialization
    /// is idempotent.
    pub fn open(path: impl AsRef<Path>, project_id: impl Into<String>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, project_id)
    }

    fn with_connection(conn: Connection, project_id: impl Into<String>) -> Result<Self> {
        conn.execute_batch(INITIAL_SCHEMA)?;
        Ok(Self {
            conn,
            project_id: project_id.into(),
        })
    }

    /// The project this store is scoped to.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO records (project_id, key, value) VALUES (?1, ?2, ?3)",
            (&self.project_id, key, &json),
        )?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM records WHERE project_id = ?1 AND key = ?2",
                (&self.project_id, key),
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

impl ProjectStore for SqliteStore {
    fn save_notes(&self, notes: &[Note]) -> Result<()> {
        self.put(NOTES_KEY, notes)
    }

    fn load_notes(&self) -> Result<Option<Vec<Note>>> {
        self.get(NOTES_KEY)
    }

    fn save_chat(&self, chat: &[ChatMessage]) -> Result<()> {
        self.put(CHAT_KEY, chat)
    }

    fn load_chat(&self) -> Result<Option<Vec<ChatMessage>>> {
        self.get(CHAT_KEY)
    }

    fn save_prompt_history(&self, calls: &[PromptCall]) -> Result<()> {
        self.put(PROMPT_HISTORY_KEY, calls)
    }

    fn load_prompt_history(&self) -> Result<Option<Vec<PromptCall>>> {
        self.get(PROMPT_HISTORY_KEY)
    }

    fn save_pinned_tags(&self, tags: &[String]) -> Result<()> {
        self.put(PINNED_TAGS_KEY, tags)
    }

    fn load_pinned_tags(&self) -> Result<Option<Vec<String>>> {
        self.get(PINNED_TAGS_KEY)
    }

    fn save_tag_summaries(&self, items: &[TagSummaryItem]) -> Result<()> {
        self.put(TAG_SUMMARY_KEY, items)
    }

    fn load_tag_summaries(&self) -> Result<Option<Vec<TagSummaryItem>>> {
        self.get(TAG_SUMMARY_KEY)
    }

    fn save_metadata(&self, metadata: &ProjectMetadata) -> Result<()> {
        self.put(METADATA_KEY, metadata)
    }

    fn load_metadata(&self) -> Result<Option<ProjectMetadata>> {
        self.get(METADATA_KEY)
    }
}
