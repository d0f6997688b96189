//! Bot core - relays group chat messages to a language model.

pub mod collaborators;
pub mod decider;
pub mod error;
pub mod image;
pub mod log;
pub mod moderation;
pub mod pipeline;
pub mod prompts;
pub mod reply;
pub mod session;
pub mod telegram;
pub mod turn;


pub use collaborators::{Attachment, Captioner, Channel, LanguageModel, Moderator};
pub use decider::{AmbiguousPolicy, Verdict};
pub use error::{CollaboratorError, PipelineError};
pub use moderation::ModerationFailurePolicy;
pub use pipeline::{InboundEvent, MessagePipeline, Outcome, PipelineConfig};
pub use prompts::persona_prompt;
pub use telegram::{telegram_to_event, TelegramClient};
pub use turn::{Role, Turn};
