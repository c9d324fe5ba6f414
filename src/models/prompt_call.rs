use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A single recorded model call, kept for debugging and audit.
///
/// The prompt history is append-only and independent of note/tag state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptCall {
    pub prompt: String,
    pub response: String,
    /// The parsed value the pipeline extracted from `response`, if any.
    #[serde(
        rename = "processedResponse",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub processed_response: Option<ProcessedResponse>,
    #[serde(rename = "stopTokens", default)]
    pub stop_tokens: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Human-readable label for the prompt site, e.g.
    /// "tags from content - create note from chat".
    #[serde(rename = "promptName", default)]
    pub prompt_name: String,
}

/// A processed response is either a single string or a list of tokens,
/// depending on the prompt/parse pair that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProcessedResponse {
    Text(String),
    Tokens(Vec<String>),
}

impl From<String> for ProcessedResponse {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ProcessedResponse {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<String>> for ProcessedResponse {
    fn from(value: Vec<String>) -> Self {
        Self::Tokens(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processed_response_serializes_untagged() {
        let text: ProcessedResponse = "a summary".into();
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"a summary\"");

        let tokens: ProcessedResponse = vec!["#a".to_string(), "#b".to_string()].into();
        assert_eq!(serde_json::to_string(&tokens).unwrap(), r##"["#a","#b"]"##);
    }

    #[test]
    fn prompt_call_roundtrips() {
        let call = PromptCall {
            prompt: "p".to_string(),
            response: "{ #a }".to_string(),
            processed_response: Some(vec!["#a".to_string()].into()),
            stop_tokens: vec!["}".to_string()],
            timestamp: OffsetDateTime::now_utc(),
            prompt_name: "tags from content".to_string(),
        };

        let json = serde_json::to_string(&call).unwrap();
        let back: PromptCall = serde_json::from_str(&json).unwrap();
        assert_eq!(back, call);
    }
}
