//! Append-only log of every model call made on a project's behalf.

use std::sync::Arc;

use anyhow::Result;

use crate::models::PromptCall;
use crate::storage::ProjectStore;

/// Records each prompt sent to the model together with its raw and processed
/// responses, for inspection and export. Entries are never edited.
pub struct PromptHistory {
    calls: Vec<PromptCall>,
    store: Arc<dyn ProjectStore>,
}

impl PromptHistory {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self {
            calls: Vec::new(),
            store,
        }
    }

    /// Logged calls in chronological order.
    pub fn calls(&self) -> &[PromptCall] {
        &self.calls
    }

    /// Appends a call record.
    pub fn log(&mut self, call: PromptCall) -> Result<()> {
        self.calls.push(call);
        self.store.save_prompt_history(&self.calls)
    }

    /// Replaces the log (load path; does not persist by itself).
    pub fn set_calls(&mut self, calls: Vec<PromptCall>) {
        self.calls = calls;
    }

    /// Replaces the log and persists it.
    pub fn restore(&mut self, calls: Vec<PromptCall>) -> Result<()> {
        self.calls = calls;
        self.store.save_prompt_history(&self.calls)
    }

    /// Clears the log.
    pub fn clear(&mut self) -> Result<()> {
        self.calls.clear();
        self.store.save_prompt_history(&self.calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStore;
    use time::OffsetDateTime;

    fn call(name: &str) -> PromptCall {
        PromptCall {
            prompt: "prompt text".to_string(),
            response: "response text".to_string(),
            processed_response: None,
            stop_tokens: Vec::new(),
            timestamp: OffsetDateTime::now_utc(),
            prompt_name: name.to_string(),
        }
    }

    #[test]
    fn log_appends_in_order() {
        let store = Arc::new(SqliteStore::in_memory("test").unwrap());
        let mut history = PromptHistory::new(store);

        history.log(call("tags-from-content")).unwrap();
        history.log(call("title-from-content")).unwrap();

        assert_eq!(history.calls().len(), 2);
        assert_eq!(history.calls()[0].prompt_name, "tags-from-content");
        assert_eq!(history.calls()[1].prompt_name, "title-from-content");
    }

    #[test]
    fn log_persists_through_store() {
        let store = Arc::new(SqliteStore::in_memory("p1").unwrap());
        let mut history = PromptHistory::new(store.clone());
        history.log(call("tag-summary")).unwrap();

        let saved = store.load_prompt_history().unwrap().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].prompt_name, "tag-summary");
    }
}
