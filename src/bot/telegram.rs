//! Telegram channel using teloxide.

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, FileId, MessageId};
use tracing::{info, warn};

use crate::bot::collaborators::{Attachment, Channel};
use crate::bot::error::{CollaboratorError, FetchError};
use crate::bot::pipeline::InboundEvent;

/// Telegram's limit for a single text message.
const MAX_MESSAGE_CHARS: usize = 4096;

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
    dry_run: bool,
}

impl TelegramClient {
    pub fn new(bot: Bot, dry_run: bool) -> Self {
        Self { bot, dry_run }
    }
}

fn api_error(context: &str, e: impl std::fmt::Display) -> CollaboratorError {
    let msg = format!("{context}: {e}");
    warn!("{}", msg);
    CollaboratorError::Http(msg)
}

/// Split text into pieces Telegram will accept, preferring line breaks.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len <= max_chars {
            current.push_str(line);
            current_len += line_len;
            continue;
        }
        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        // A single line longer than the limit gets cut at char boundaries.
        let mut chars = line.chars().peekable();
        while chars.peek().is_some() {
            let piece: String = chars.by_ref().take(max_chars).collect();
            let piece_len = piece.chars().count();
            if piece_len == max_chars {
                chunks.push(piece);
            } else {
                current = piece;
                current_len = piece_len;
            }
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl Channel for TelegramClient {
    async fn delete_message(&self, channel_id: i64, message_id: i64) -> Result<(), CollaboratorError> {
        if self.dry_run {
            info!("[DRY RUN] Would delete message {} in chat {}", message_id, channel_id);
            return Ok(());
        }

        self.bot
            .delete_message(ChatId(channel_id), MessageId(message_id as i32))
            .await
            .map_err(|e| api_error("Failed to delete message", e))?;

        Ok(())
    }

    async fn send_typing(&self, channel_id: i64) -> Result<(), CollaboratorError> {
        if self.dry_run {
            return Ok(());
        }

        self.bot
            .send_chat_action(ChatId(channel_id), ChatAction::Typing)
            .await
            .map_err(|e| api_error("Failed to send typing", e))?;

        Ok(())
    }

    async fn send_message(&self, channel_id: i64, text: &str) -> Result<(), CollaboratorError> {
        if self.dry_run {
            info!("[DRY RUN] Would send to chat {}: {}", channel_id, text);
            return Ok(());
        }

        for chunk in split_message(text, MAX_MESSAGE_CHARS) {
            self.bot
                .send_message(ChatId(channel_id), chunk)
                .await
                .map_err(|e| api_error("Failed to send", e))?;
        }

        Ok(())
    }

    async fn fetch_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>, FetchError> {
        let file = self
            .bot
            .get_file(FileId(attachment.location.clone()))
            .await
            .map_err(|e| FetchError(format!("Failed to get file info: {e}")))?;

        let mut data = Vec::new();
        self.bot
            .download_file(&file.path, &mut data)
            .await
            .map_err(|e| FetchError(format!("Failed to download file: {e}")))?;

        info!("📥 Downloaded attachment ({} bytes)", data.len());
        Ok(data)
    }
}

/// Convert a Telegram message into a pipeline event.
pub fn telegram_to_event(msg: &Message) -> Option<InboundEvent> {
    let user = msg.from.as_ref()?;
    let author_name = user
        .username
        .clone()
        .unwrap_or_else(|| user.first_name.clone());

    let text = msg
        .text()
        .or_else(|| msg.caption())
        .unwrap_or("")
        .to_string();

    let mut attachments = Vec::new();
    if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        attachments.push(Attachment {
            location: photo.file.id.0.clone(),
            content_type: Some("image/jpeg".to_string()),
        });
    } else if let Some(doc) = msg.document() {
        attachments.push(Attachment {
            location: doc.file.id.0.clone(),
            content_type: doc.mime_type.as_ref().map(|m| m.to_string()),
        });
    }

    Some(InboundEvent {
        id: msg.id.0 as i64,
        author_id: user.id.0 as i64,
        author_name,
        author_is_bot: user.is_bot,
        channel_id: msg.chat.id.0,
        text,
        attachments,
    })
}
