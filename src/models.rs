mod chat;
mod content;
mod ids;
mod note;
mod project;
mod prompt_call;

pub use chat::{Author, ChatMessage};
pub use content::{ContentBlock, ListItem};
pub use ids::{ChatId, NoteId};
pub use note::{Note, NoteBuilder};
pub use project::{ProjectMetadata, QuoteInsight, TagSummaryItem, WrappedInsight};
pub use prompt_call::{ProcessedResponse, PromptCall};
