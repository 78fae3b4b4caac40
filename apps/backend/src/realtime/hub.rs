use actix::prelude::*;
use dashmap::DashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{Broadcaster, SessionNotice};

/// Serialized notice pushed to one websocket connection.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct NoticeFrame(pub String);

/// Websocket subscribers grouped by session code.
#[derive(Default)]
pub struct SessionHub {
    sessions: DashMap<String, DashMap<Uuid, Recipient<NoticeFrame>>>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, session_code: &str, recipient: Recipient<NoticeFrame>) -> Uuid {
        let token = Uuid::new_v4();
        let entry = self
            .sessions
            .entry(session_code.to_string())
            .or_default();
        entry.insert(token, recipient);
        token
    }

    pub fn unregister(&self, session_code: &str, token: Uuid) {
        let now_empty = match self.sessions.get(session_code) {
            Some(entry) => {
                entry.remove(&token);
                entry.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.sessions
                .remove_if(session_code, |_, subscribers| subscribers.is_empty());
        }
    }

    pub fn subscriber_count(&self, session_code: &str) -> usize {
        self.sessions
            .get(session_code)
            .map_or(0, |entry| entry.len())
    }
}

impl Broadcaster for SessionHub {
    fn notify(&self, session_code: &str, notice: SessionNotice) {
        let Some(entry) = self.sessions.get(session_code) else {
            return;
        };
        let payload = match serde_json::to_string(&notice) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, event = notice.name(), "Failed to serialize notice");
                return;
            }
        };
        debug!(
            session_code,
            event = notice.name(),
            subscribers = entry.len(),
            "Broadcasting notice"
        );
        for recipient in entry.iter() {
            recipient.value().do_send(NoticeFrame(payload.clone()));
        }
    }
}
