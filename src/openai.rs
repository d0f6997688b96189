//! OpenAI-compatible client for chat completions and moderation.

use std::borrow::Cow;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::bot::collaborators::{LanguageModel, Moderator};
use crate::bot::error::CollaboratorError;
use crate::bot::turn::Turn;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct Client {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Serialize, Debug, PartialEq)]
struct ApiMessage<'a> {
    role: &'static str,
    content: Cow<'a, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct ModerationRequest<'a> {
    input: &'a str,
}

#[derive(Deserialize)]
struct ModerationResponse {
    results: Vec<ModerationResult>,
}

#[derive(Deserialize)]
struct ModerationResult {
    flagged: bool,
}

/// Reduce a display name to the characters the `name` field accepts.
fn sanitize_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .take(64)
        .collect();
    if cleaned.chars().all(|c| c == '_') {
        None
    } else {
        Some(cleaned)
    }
}

/// Speakers whose name does not survive sanitizing intact are also named in the content,
/// so distinct people never collapse into one `name` or lose it entirely.
fn to_api_message(turn: &Turn) -> ApiMessage<'_> {
    let Some(speaker) = turn.speaker.as_deref() else {
        return ApiMessage {
            role: turn.role.as_str(),
            content: Cow::Borrowed(turn.content.as_str()),
            name: None,
        };
    };

    let name = sanitize_name(speaker);
    let content = if name.as_deref() == Some(speaker) {
        Cow::Borrowed(turn.content.as_str())
    } else {
        Cow::Owned(format!("{speaker}: {}", turn.content))
    };

    ApiMessage {
        role: turn.role.as_str(),
        content,
        name,
    }
}

impl Client {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            http: reqwest::Client::new(),
        }
    }

    async fn post<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp, CollaboratorError> {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| CollaboratorError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Api { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| CollaboratorError::Parse(e.to_string()))
    }
}

#[async_trait]
impl LanguageModel for Client {
    async fn complete(&self, model: &str, messages: &[Turn]) -> Result<Option<String>, CollaboratorError> {
        let request = ChatRequest {
            model,
            messages: messages.iter().map(to_api_message).collect(),
        };

        let response: ChatResponse = self.post("chat/completions", &request).await?;

        let choice = response.choices.into_iter().next().ok_or(CollaboratorError::Empty)?;
        Ok(choice.message.content)
    }
}

#[async_trait]
impl Moderator for Client {
    async fn moderate(&self, text: &str) -> Result<bool, CollaboratorError> {
        let response: ModerationResponse = self
            .post("moderations", &ModerationRequest { input: text })
            .await?;

        response
            .results
            .first()
            .map(|r| r.flagged)
            .ok_or(CollaboratorError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("alice_99"), Some("alice_99".to_string()));
        assert_eq!(sanitize_name("Big Al"), Some("Big_Al".to_string()));
        assert_eq!(sanitize_name("Лиса"), None);
        assert_eq!(sanitize_name(&"a".repeat(100)).map(|n| n.len()), Some(64));
    }

    #[test]
    fn test_lossy_names_kept_in_content() {
        let turn = Turn::user("Лиса", "привет");
        let msg = to_api_message(&turn);
        assert_eq!(msg.name, None);
        assert_eq!(msg.content, "Лиса: привет");

        // Distinct speakers that sanitize to the same name stay distinguishable
        let spaced = Turn::user("Big Al", "hi");
        let underscored = Turn::user("Big_Al", "hi");
        let a = to_api_message(&spaced);
        let b = to_api_message(&underscored);
        assert_eq!(a.name.as_deref(), Some("Big_Al"));
        assert_eq!(b.name.as_deref(), Some("Big_Al"));
        assert_eq!(a.content, "Big Al: hi");
        assert_eq!(b.content, "hi");
        assert_ne!(a, b);

        let plain = Turn::user("alice_99", "hello");
        let msg = to_api_message(&plain);
        assert_eq!(msg.name.as_deref(), Some("alice_99"));
        assert!(matches!(msg.content, Cow::Borrowed("hello")));
    }

    #[test]
    fn test_request_shape() {
        let turns = [Turn::system("persona"), Turn::user("bob", "hey foxy!"), Turn::assistant("hii!")];
        let request = ChatRequest {
            model: "gpt-4",
            messages: turns.iter().map(to_api_message).collect(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "gpt-4",
                "messages": [
                    {"role": "system", "content": "persona"},
                    {"role": "user", "content": "hey foxy!", "name": "bob"},
                    {"role": "assistant", "content": "hii!"}
                ]
            })
        );
    }

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"hii!"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("hii!"));

        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[test]
    fn test_parse_moderation_response() {
        let body = r#"{"id":"modr-1","model":"text-moderation-007","results":[{"flagged":true,"categories":{"sexual":true}}]}"#;
        let parsed: ModerationResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.results[0].flagged);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = Client::new("k".to_string(), Some("http://localhost:8080/v1/".to_string()));
        assert_eq!(client.base_url, "http://localhost:8080/v1");
    }
}
