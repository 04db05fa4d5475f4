//! Request and response bodies of the search endpoint.

use serde::{Deserialize, Serialize};

/// How exhaustively the backend searches before answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchContextSize {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserLocation {
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebSearchOptions {
    pub search_context_size: SearchContextSize,
    pub user_location: UserLocation,
}

/// Body POSTed to the search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPayload {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub enable_search_classifier: bool,
    pub web_search_options: WebSearchOptions,
}

impl SearchPayload {
    pub(crate) fn new(
        model: &str,
        prompt: String,
        context_size: SearchContextSize,
        country: &str,
    ) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage::user(prompt)],
            enable_search_classifier: true,
            web_search_options: WebSearchOptions {
                search_context_size: context_size,
                user_location: UserLocation {
                    country: country.to_string(),
                },
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub citations: Option<Vec<String>>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Usage {
    #[serde(default)]
    pub total_tokens: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_serializes_expected_keys() {
        let payload = SearchPayload::new("sonar", "prompt".into(), SearchContextSize::Medium, "AE");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["model"], "sonar");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["enable_search_classifier"], true);
        assert_eq!(json["web_search_options"]["search_context_size"], "medium");
        assert_eq!(json["web_search_options"]["user_location"]["country"], "AE");
    }

    #[test]
    fn response_tolerates_missing_optional_fields() {
        let json = r#"{"choices":[{"message":{"content":"text"}}]}"#;
        let resp: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.choices.len(), 1);
        assert!(resp.citations.is_none());
        assert!(resp.usage.is_none());
        assert!(resp.model.is_none());
    }
}
