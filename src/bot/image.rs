//! Turns image attachments into caption turns.

use std::sync::Arc;

use base64::Engine;
use tracing::{info, warn};

use crate::bot::collaborators::{Attachment, Captioner, Channel};
use crate::bot::error::FetchError;
use crate::bot::log::ConversationLog;
use crate::bot::turn::Turn;

/// Caption used when the captioning service fails.
pub const UNAVAILABLE_CAPTION: &str = "<captioning service unavailable>";

pub fn caption_turn_content(caption: &str) -> String {
    format!("[Image description: \"{caption}\"]")
}

pub struct ImageDescriber {
    captioner: Arc<dyn Captioner>,
    channel: Arc<dyn Channel>,
}

impl ImageDescriber {
    pub fn new(captioner: Arc<dyn Captioner>, channel: Arc<dyn Channel>) -> Self {
        Self { captioner, channel }
    }

    /// Caption base64 image bytes. Never fails: service errors yield the sentinel.
    pub async fn describe(&self, image_base64: &str) -> String {
        match self.captioner.describe(image_base64).await {
            Ok(predictions) => match predictions.into_iter().next() {
                Some(caption) => caption,
                None => {
                    warn!("Captioning returned no predictions");
                    UNAVAILABLE_CAPTION.to_string()
                }
            },
            Err(e) => {
                warn!("Captioning failed: {e}");
                UNAVAILABLE_CAPTION.to_string()
            }
        }
    }

    /// Fetch, caption and append one attachment as a turn from `speaker`.
    ///
    /// A fetch failure appends nothing.
    pub async fn describe_attachment(
        &self,
        attachment: &Attachment,
        speaker: &str,
        log: &mut ConversationLog,
    ) -> Result<(), FetchError> {
        let bytes = self.channel.fetch_attachment(attachment).await?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        info!("🖼️ Captioning image from {} ({} bytes)", speaker, bytes.len());

        let caption = self.describe(&encoded).await;
        log.append(Turn::user(speaker, caption_turn_content(&caption)));
        Ok(())
    }
}
