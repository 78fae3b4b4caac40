//! Post-commit change notifications for session subscribers.

use serde::Serialize;

use crate::domain::{Caption, LeaderboardEntry, SessionStatus};

pub mod hub;
pub mod session;

pub use hub::SessionHub;
pub use session::WsSession;

/// A state change worth telling subscribers about. Submission notices carry
/// counts only; caption text is published with the reveal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum SessionNotice {
    PlayerJoined {
        player_id: String,
        display_name: String,
        player_count: usize,
    },
    RoundStarted {
        round_id: String,
        number: u32,
        image_url: String,
    },
    CaptionSubmitted {
        round_id: String,
        submitted: usize,
        player_count: usize,
    },
    RoundRevealed {
        round_id: String,
        number: u32,
        status: SessionStatus,
        captions: Vec<Caption>,
        leaderboard: Vec<LeaderboardEntry>,
    },
    SessionFinished {
        leaderboard: Vec<LeaderboardEntry>,
    },
}

impl SessionNotice {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlayerJoined { .. } => "player_joined",
            Self::RoundStarted { .. } => "round_started",
            Self::CaptionSubmitted { .. } => "caption_submitted",
            Self::RoundRevealed { .. } => "round_revealed",
            Self::SessionFinished { .. } => "session_finished",
        }
    }
}

/// Fire-and-forget fan-out. Implementations must not block or fail the
/// caller; delivery problems are logged and dropped.
pub trait Broadcaster: Send + Sync {
    fn notify(&self, session_code: &str, notice: SessionNotice);
}

/// Discards every notice.
#[derive(Debug, Default, Clone)]
pub struct NoopBroadcaster;

impl Broadcaster for NoopBroadcaster {
    fn notify(&self, _session_code: &str, _notice: SessionNotice) {}
}
