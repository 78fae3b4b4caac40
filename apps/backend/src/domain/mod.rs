//! Pure game logic: data model, session state machine, caption text rules,
//! judge reconciliation, fallback scoring, and leaderboard aggregation.
//!
//! Nothing in here touches storage, the network, or the clock beyond
//! values passed in by callers.

pub mod caption_text;
pub mod fallback_scorer;
pub mod leaderboard;
pub mod lifecycle;
pub mod model;
pub mod reconcile;
pub mod session_code;

pub use lifecycle::SessionEvent;
pub use model::{
    Caption, LeaderboardEntry, Player, Round, RoundStatus, Score, Session, SessionSettings,
    SessionStatus,
};
