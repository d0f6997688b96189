//! Message pipeline.
//!
//! Each inbound event goes through
//! `Idle → Moderating → (Describing)? → Deciding → (Replying)? → Idle`,
//! or ends early as `Ignored`. The session log is locked for the whole run.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::bot::collaborators::{Attachment, Captioner, Channel, LanguageModel, Moderator};
use crate::bot::decider::{AmbiguousPolicy, ResponseDecider};
use crate::bot::error::PipelineError;
use crate::bot::image::ImageDescriber;
use crate::bot::moderation::{Classification, ModerationFailurePolicy, ModerationGate};
use crate::bot::reply::ReplyGenerator;
use crate::bot::session::Sessions;
use crate::bot::turn::Turn;

/// A message as delivered by the channel.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub author_is_bot: bool,
    pub channel_id: i64,
    pub text: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Moderating,
    Describing,
    Deciding,
    Replying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    WrongChannel,
    SelfAuthored,
    Flagged,
    /// Nothing was added to the log (empty text and no usable image).
    NothingToAppend,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ignored(IgnoreReason),
    /// The decider said not to respond.
    Silent,
    Replied(String),
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub bot_user_id: i64,
    pub bot_name: String,
    pub channel_ids: HashSet<i64>,
    pub decision_model: String,
    pub reply_model: String,
    pub on_ambiguous: AmbiguousPolicy,
    pub on_moderation_error: ModerationFailurePolicy,
}

pub struct MessagePipeline {
    config: PipelineConfig,
    sessions: Sessions,
    channel: Arc<dyn Channel>,
    moderation: ModerationGate,
    describer: ImageDescriber,
    decider: ResponseDecider,
    replier: ReplyGenerator,
}

impl MessagePipeline {
    pub fn new(
        config: PipelineConfig,
        persona: String,
        channel: Arc<dyn Channel>,
        moderator: Arc<dyn Moderator>,
        captioner: Arc<dyn Captioner>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            sessions: Sessions::new(persona),
            moderation: ModerationGate::new(moderator, config.on_moderation_error),
            describer: ImageDescriber::new(captioner, channel.clone()),
            decider: ResponseDecider::new(llm.clone(), &config.decision_model, &config.bot_name),
            replier: ReplyGenerator::new(llm, &config.reply_model),
            channel,
            config,
        }
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    fn filter(&self, event: &InboundEvent) -> Option<IgnoreReason> {
        if !self.config.channel_ids.contains(&event.channel_id) {
            return Some(IgnoreReason::WrongChannel);
        }
        if event.author_id == self.config.bot_user_id || event.author_is_bot {
            return Some(IgnoreReason::SelfAuthored);
        }
        None
    }

    /// Run one inbound event to completion.
    pub async fn handle(&self, event: InboundEvent) -> Result<Outcome, PipelineError> {
        if let Some(reason) = self.filter(&event) {
            debug!("Ignoring message {} in chat {}: {:?}", event.id, event.channel_id, reason);
            return Ok(Outcome::Ignored(reason));
        }

        let session = self.sessions.get(event.channel_id).await;
        let mut log = session.log.lock().await;

        let preview: String = event.text.chars().take(100).collect();
        info!("📨 [{}] {} ({}): \"{}\"", session.channel_id, event.author_name, event.author_id, preview);

        debug!("Stage: {:?}", Stage::Moderating);
        let classification = self
            .moderation
            .classify(&event.text)
            .await
            .map_err(PipelineError::Moderation)?;

        if classification == Classification::Flagged {
            info!("🗑️ Removing flagged message {} from {}", event.id, event.author_name);
            if let Err(e) = self.channel.delete_message(event.channel_id, event.id).await {
                warn!("Failed to delete: {e}");
            }
            return Ok(Outcome::Ignored(IgnoreReason::Flagged));
        }

        let before = log.len();

        if let [attachment] = event.attachments.as_slice()
            && attachment.is_image()
        {
            debug!("Stage: {:?}", Stage::Describing);
            if let Err(e) = self
                .describer
                .describe_attachment(attachment, &event.author_name, &mut log)
                .await
            {
                warn!("Skipping image from {}: {e}", event.author_name);
            }
        }

        log.append(Turn::user(&event.author_name, &event.text));

        if log.len() == before {
            return Ok(Outcome::Ignored(IgnoreReason::NothingToAppend));
        }

        debug!("Stage: {:?}", Stage::Deciding);
        let verdict = self.decider.decide(&log).await;
        if !self.config.on_ambiguous.should_respond(verdict) {
            debug!("Stage: {:?}", Stage::Idle);
            return Ok(Outcome::Silent);
        }

        debug!("Stage: {:?}", Stage::Replying);
        if let Err(e) = self.channel.send_typing(event.channel_id).await {
            warn!("Failed to send typing: {e}");
        }

        let turn = self.replier.reply(&mut log).await.map_err(|e| {
            error!("Reply failed: {e}");
            PipelineError::Reply(e)
        })?;

        self.channel
            .send_message(event.channel_id, &turn.content)
            .await
            .map_err(PipelineError::Send)?;

        let preview: String = turn.content.chars().take(100).collect();
        info!("💬 Replied: \"{}\"", preview);

        debug!("Stage: {:?}", Stage::Idle);
        Ok(Outcome::Replied(turn.content))
    }
}
