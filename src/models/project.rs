use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Project metadata stored alongside the note collection.
///
/// Cached insight results are carried through persistence and export so that
/// a project round-trips losslessly; no insight generation surface exists in
/// this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "dateCreated", with = "time::serde::rfc3339")]
    pub date_created: OffsetDateTime,
    #[serde(rename = "quoteInsights", default)]
    pub quote_insights: Vec<QuoteInsight>,
    #[serde(rename = "wrappedInsights", default)]
    pub wrapped_insights: Vec<WrappedInsight>,
}

impl ProjectMetadata {
    /// Creates metadata for a fresh, untitled project.
    pub fn blank() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: "Untitled project".to_string(),
            description: String::new(),
            date_created: OffsetDateTime::now_utc(),
            quote_insights: Vec::new(),
            wrapped_insights: Vec::new(),
        }
    }
}

/// A persisted tag → summary pair.
///
/// Summaries are stored and exported as a list of items rather than a map,
/// matching the export document format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSummaryItem {
    pub tag: String,
    pub summary: String,
}

/// A cached quote-style insight result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteInsight {
    pub quote: String,
    #[serde(rename = "noteId")]
    pub note_id: String,
}

/// A cached wrapped-style insight result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedInsight {
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub response: String,
    pub label: String,
    #[serde(default)]
    pub color: String,
}
