//! Reply generation with the high-capability model.

use std::sync::Arc;

use tracing::warn;

use crate::bot::collaborators::LanguageModel;
use crate::bot::error::CollaboratorError;
use crate::bot::log::ConversationLog;
use crate::bot::turn::Turn;

/// Sent when the model returns no text.
pub const FALLBACK_REPLY: &str = "No response.";

pub struct ReplyGenerator {
    llm: Arc<dyn LanguageModel>,
    model: String,
}

impl ReplyGenerator {
    pub fn new(llm: Arc<dyn LanguageModel>, model: impl Into<String>) -> Self {
        Self { llm, model: model.into() }
    }

    /// Complete the conversation and append the reply as an assistant turn.
    pub async fn reply(&self, log: &mut ConversationLog) -> Result<Turn, CollaboratorError> {
        let text = self.llm.complete(&self.model, log.snapshot()).await?;

        let text = match text.map(|t| t.trim().to_string()) {
            Some(t) if !t.is_empty() => t,
            _ => {
                warn!("Reply model returned no text, using fallback");
                FALLBACK_REPLY.to_string()
            }
        };

        let turn = Turn::assistant(text);
        log.append(turn.clone());
        Ok(turn)
    }
}
