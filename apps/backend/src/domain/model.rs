//! Session, player, round, and caption records as the core sees them.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::errors::domain::{DomainError, ValidationKind};

pub const MIN_ROUNDS: u8 = 1;
pub const MAX_ROUNDS: u8 = 10;

/// Lifecycle status of a session. `Finished` and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Lobby,
    InRound,
    Revealing,
    Finished,
    Expired,
}

impl SessionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lobby => "lobby",
            Self::InRound => "in_round",
            Self::Revealing => "revealing",
            Self::Finished => "finished",
            Self::Expired => "expired",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "lobby" => Some(Self::Lobby),
            "in_round" => Some(Self::InRound),
            "revealing" => Some(Self::Revealing),
            "finished" => Some(Self::Finished),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Active,
    Scoring,
    Revealed,
}

impl RoundStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Scoring => "scoring",
            Self::Revealed => "revealed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "scoring" => Some(Self::Scoring),
            "revealed" => Some(Self::Revealed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub rounds_total: u8,
}

impl SessionSettings {
    pub fn new(rounds_total: u8) -> Result<Self, DomainError> {
        if !(MIN_ROUNDS..=MAX_ROUNDS).contains(&rounds_total) {
            return Err(DomainError::validation(
                ValidationKind::InvalidSettings,
                format!("rounds_total must be between {MIN_ROUNDS} and {MAX_ROUNDS}"),
            ));
        }
        Ok(Self { rounds_total })
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { rounds_total: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub code: String,
    pub status: SessionStatus,
    pub host_player_id: String,
    pub settings: SessionSettings,
    pub current_round: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl Session {
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }

    pub fn is_last_round(&self) -> bool {
        self.current_round >= u32::from(self.settings.rounds_total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub display_name: String,
    pub is_host: bool,
    /// Position in the session's join sequence; the host is 0.
    pub join_order: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub id: String,
    pub number: u32,
    pub image_url: String,
    pub status: RoundStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub ends_at: Option<OffsetDateTime>,
}

/// A judged score. `total` is always `humour + relevance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub humour: u8,
    pub relevance: u8,
    pub total: u8,
    pub roast: String,
}

impl Score {
    pub const MAX_COMPONENT: u8 = 10;

    /// Clamp both components into `0..=10` and derive the total.
    pub fn clamped(humour: i64, relevance: i64, roast: impl Into<String>) -> Self {
        let clamp = |v: i64| v.clamp(0, i64::from(Self::MAX_COMPONENT)) as u8;
        let humour = clamp(humour);
        let relevance = clamp(relevance);
        Self {
            humour,
            relevance,
            total: humour + relevance,
            roast: roast.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub id: String,
    pub round_id: String,
    pub player_id: String,
    /// Display name at submission time.
    pub display_name: String,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
    pub score: Option<Score>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player_id: String,
    pub display_name: String,
    pub total_score: u32,
    pub rank: u32,
}

/// Prefixed, time-sortable identifier for a new record.
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", ulid::Ulid::new().to_string().to_lowercase())
}
