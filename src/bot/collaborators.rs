//! Boundaries to the outside world.
//!
//! The pipeline only talks to these traits. Production implementations live in
//! `bot::telegram`, `crate::openai` and `crate::caption`; tests use in-memory fakes.

use async_trait::async_trait;

use crate::bot::error::{CollaboratorError, FetchError};
use crate::bot::turn::Turn;

/// A file attached to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Transport-specific handle used to download the bytes.
    pub location: String,
    /// Declared MIME type, if the platform reported one.
    pub content_type: Option<String>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|t| t.starts_with("image"))
    }
}

/// The chat platform connection.
#[async_trait]
pub trait Channel: Send + Sync {
    async fn delete_message(&self, channel_id: i64, message_id: i64) -> Result<(), CollaboratorError>;
    async fn send_typing(&self, channel_id: i64) -> Result<(), CollaboratorError>;
    async fn send_message(&self, channel_id: i64, text: &str) -> Result<(), CollaboratorError>;
    async fn fetch_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>, FetchError>;
}

/// Content moderation service.
#[async_trait]
pub trait Moderator: Send + Sync {
    /// Returns `true` when the text is flagged.
    async fn moderate(&self, text: &str) -> Result<bool, CollaboratorError>;
}

/// Chat completion service.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns the completion text, or `None` if the service produced none.
    async fn complete(&self, model: &str, messages: &[Turn]) -> Result<Option<String>, CollaboratorError>;
}

/// Image captioning service.
#[async_trait]
pub trait Captioner: Send + Sync {
    async fn describe(&self, image_base64: &str) -> Result<Vec<String>, CollaboratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(content_type: Option<&str>) -> Attachment {
        Attachment {
            location: "f".to_string(),
            content_type: content_type.map(String::from),
        }
    }

    #[test]
    fn test_is_image() {
        assert!(attachment(Some("image/png")).is_image());
        assert!(attachment(Some("image/jpeg")).is_image());
        assert!(!attachment(Some("application/pdf")).is_image());
        assert!(!attachment(None).is_image());
    }
}
