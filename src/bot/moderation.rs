//! Content moderation gate in front of the conversation log.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{info, warn};

use crate::bot::collaborators::Moderator;
use crate::bot::error::CollaboratorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Flagged,
    Clean,
}

/// What to do when the moderation service itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModerationFailurePolicy {
    /// Abort the event. Nothing is appended and the message is left alone.
    #[default]
    FailClosed,
    /// Log and treat the message as clean.
    FailOpen,
}

impl FromStr for ModerationFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drop" | "fail-closed" | "closed" => Ok(Self::FailClosed),
            "allow" | "fail-open" | "open" => Ok(Self::FailOpen),
            other => Err(format!("unknown moderation failure policy '{other}' (expected drop or allow)")),
        }
    }
}

pub struct ModerationGate {
    moderator: Arc<dyn Moderator>,
    on_failure: ModerationFailurePolicy,
}

impl ModerationGate {
    pub fn new(moderator: Arc<dyn Moderator>, on_failure: ModerationFailurePolicy) -> Self {
        Self { moderator, on_failure }
    }

    /// Classify a message. Empty text is never sent to the service.
    pub async fn classify(&self, text: &str) -> Result<Classification, CollaboratorError> {
        if text.is_empty() {
            return Ok(Classification::Clean);
        }

        match self.moderator.moderate(text).await {
            Ok(true) => {
                info!("🚩 Moderation: flagged");
                Ok(Classification::Flagged)
            }
            Ok(false) => Ok(Classification::Clean),
            Err(e) => match self.on_failure {
                ModerationFailurePolicy::FailClosed => Err(e),
                ModerationFailurePolicy::FailOpen => {
                    warn!("Moderation error, letting message through: {e}");
                    Ok(Classification::Clean)
                }
            },
        }
    }
}
