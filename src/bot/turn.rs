//! Conversation turns.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One attributed unit of conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// Display name of the human who said it. `None` for system and bot turns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            speaker: None,
        }
    }

    pub fn user(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            speaker: Some(speaker.into()),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            speaker: None,
        }
    }

    /// Who said this, for restating it in prompts.
    pub fn speaker_label(&self) -> &str {
        self.speaker.as_deref().unwrap_or(self.role.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let t = Turn::user("alice", "hi");
        assert_eq!(t.role, Role::User);
        assert_eq!(t.speaker.as_deref(), Some("alice"));

        let t = Turn::assistant("hello");
        assert_eq!(t.role, Role::Assistant);
        assert!(t.speaker.is_none());
    }

    #[test]
    fn test_speaker_label_falls_back_to_role() {
        assert_eq!(Turn::user("bob", "x").speaker_label(), "bob");
        assert_eq!(Turn::assistant("x").speaker_label(), "assistant");
    }

    #[test]
    fn test_serialize_omits_missing_speaker() {
        let json = serde_json::to_string(&Turn::assistant("yo")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"yo"}"#);
    }
}
