pub mod assistant;
pub mod chat;
pub mod export;
pub mod gemini;
pub mod history;
pub mod index;
pub mod markdown;
pub mod models;
pub mod notebook;
pub mod prompts;
pub mod seed;
pub mod storage;
pub mod tags;

pub use assistant::{Assistant, Notifier};
pub use chat::ChatLog;
pub use history::PromptHistory;
pub use index::TagIndex;
pub use models::{Author, ChatId, ChatMessage, ContentBlock, Note, NoteBuilder, NoteId};
pub use notebook::Notebook;
pub use storage::{ProjectStore, SqliteStore};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn store_accessible_from_crate_root() {
        let store = SqliteStore::in_memory("smoke");
        assert!(store.is_ok());
    }

    #[test]
    fn types_accessible_from_crate_root() {
        let store = Arc::new(SqliteStore::in_memory("smoke").unwrap());
        let mut notebook = Notebook::new(store);

        let id = notebook
            .add_note("A quick test #scratch", Author::User, "")
            .unwrap();
        let note = notebook.get_note(&id).unwrap();
        assert_eq!(note.tags, ["#scratch"]);

        let index = TagIndex::new();
        assert!(index.tags().is_empty());
    }
}
