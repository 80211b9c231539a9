//! Blocking chat-completion client.
//!
//! Speaks the `/chat/completions` wire shape, so it works against OpenAI
//! and any compatible gateway. Calls are synchronous; callers own any
//! retry policy.

use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct ChatClient {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    client: reqwest::blocking::Client,
}

impl ChatClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one completion round-trip and return the first choice's text.
    pub fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        tracing::debug!(model = %self.model, messages = messages.len(), "sending chat completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| LlmError::Parse(e.to_string()))?;
        let choice = parsed.choices.into_iter().next().ok_or(LlmError::EmptyChoices)?;
        choice.message.content.ok_or(LlmError::EmptyChoices)
    }
}

// ---------------------------------------------------------------------------
// Response cleanup
// ---------------------------------------------------------------------------

/// Strip markdown code fences and surrounding prose from a completion that
/// is supposed to be a JSON document. Returns the slice between the first
/// `{` or `[` and its matching end, after removing any ``` fences.
pub fn extract_json(raw: &str) -> Result<&str> {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text = text.trim();

    let start = text
        .find(['{', '['])
        .ok_or_else(|| LlmError::Parse("no json object in response".into()))?;
    let end = text
        .rfind(['}', ']'])
        .ok_or_else(|| LlmError::Parse("unterminated json in response".into()))?;
    if end < start {
        return Err(LlmError::Parse("malformed json in response".into()));
    }
    Ok(&text[start..=end])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_passes_bare_object_through() {
        assert_eq!(extract_json(r#"{"a": 1}"#).unwrap(), r#"{"a": 1}"#);
    }

    #[test]
    fn extract_json_strips_fences() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json(raw).unwrap(), r#"{"a": 1}"#);
    }

    #[test]
    fn extract_json_drops_leading_prose() {
        let raw = "Here is the result:\n{\"a\": 1}";
        assert_eq!(extract_json(raw).unwrap(), r#"{"a": 1}"#);
    }

    #[test]
    fn extract_json_handles_arrays() {
        assert_eq!(extract_json("[1, 2]").unwrap(), "[1, 2]");
    }

    #[test]
    fn extract_json_rejects_plain_prose() {
        assert!(extract_json("no json here").is_err());
    }

    #[test]
    fn complete_returns_first_choice() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#)
            .create();

        let client = ChatClient::new(server.url(), "test-key", "gpt-4o-mini");
        let out = client.complete(&[ChatMessage::user("hi")]).unwrap();
        assert_eq!(out, "hello");
        mock.assert();
    }

    #[test]
    fn complete_surfaces_api_errors() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create();

        let client = ChatClient::new(server.url(), "test-key", "gpt-4o-mini");
        let err = client.complete(&[ChatMessage::user("hi")]).unwrap_err();
        match err {
            LlmError::Api { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn complete_rejects_empty_choices() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create();

        let client = ChatClient::new(server.url(), "test-key", "gpt-4o-mini");
        assert!(matches!(
            client.complete(&[ChatMessage::user("hi")]),
            Err(LlmError::EmptyChoices)
        ));
    }
}
