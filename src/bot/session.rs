//! Per-channel conversation sessions.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::bot::log::ConversationLog;
use crate::bot::turn::Turn;

/// Conversation state for one channel.
///
/// The pipeline holds `log` locked for the whole run of an event, so events in
/// the same channel are processed one after another.
pub struct Session {
    pub channel_id: i64,
    pub log: Mutex<ConversationLog>,
}

/// All sessions, created lazily with the persona turn.
pub struct Sessions {
    persona: String,
    sessions: Mutex<HashMap<i64, Arc<Session>>>,
}

impl Sessions {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, channel_id: i64) -> Arc<Session> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(channel_id)
            .or_insert_with(|| {
                info!("Starting conversation for chat {}", channel_id);
                Arc::new(Session {
                    channel_id,
                    log: Mutex::new(ConversationLog::new(self.persona.clone())),
                })
            })
            .clone()
    }

    /// Copy of a channel's history, if the channel has a session.
    pub async fn snapshot(&self, channel_id: i64) -> Option<Vec<Turn>> {
        let session = self.sessions.lock().await.get(&channel_id).cloned()?;
        let log = session.log.lock().await;
        Some(log.snapshot().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sessions_are_per_channel() {
        let sessions = Sessions::new("persona");
        sessions.get(1).await.log.lock().await.append(Turn::user("a", "in one"));

        assert_eq!(sessions.snapshot(1).await.unwrap().len(), 2);
        assert_eq!(sessions.get(2).await.log.lock().await.len(), 1);
        assert!(sessions.snapshot(3).await.is_none());
    }

    #[tokio::test]
    async fn test_same_session_returned() {
        let sessions = Sessions::new("persona");
        let a = sessions.get(7).await;
        let b = sessions.get(7).await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.channel_id, 7);
    }
}
