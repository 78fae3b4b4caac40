//! Storage contract shared by the in-memory and relational backends.
//!
//! Every primitive is atomic on its own, including the composite round
//! transitions, which either apply every write or none. Uniqueness (session codes and one
//! caption per round and player) is enforced by the backend as an
//! insert-if-absent, never by a read followed by a write in the caller.
//! Methods that address a session by code return `Ok(None)` when the
//! session does not exist.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::model::{Caption, Player, Round, Score, Session, SessionSettings};
use crate::domain::SessionStatus;
use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind};

pub mod memory;
pub mod sea;

pub use memory::InMemoryStorage;
pub use sea::SeaStorage;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// A uniqueness constraint rejected the write.
    #[error("duplicate {0}")]
    Duplicate(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// Persisted data could not be mapped back into the model.
    #[error("corrupt record: {0}")]
    Corrupt(String),
    #[error("storage failure: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StorageError::Duplicate(_))
    }
}

impl From<StorageError> for DomainError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate(what) => {
                DomainError::conflict(ConflictKind::Other(what.clone()), format!("duplicate {what}"))
            }
            StorageError::Unavailable(detail) => {
                DomainError::infra(InfraErrorKind::DbUnavailable, detail)
            }
            StorageError::Corrupt(detail) => {
                DomainError::infra(InfraErrorKind::DataCorruption, detail)
            }
            StorageError::Backend(detail) => {
                DomainError::infra(InfraErrorKind::Other("storage".into()), detail)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: String,
    pub code: String,
    pub settings: SessionSettings,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewPlayer {
    pub id: String,
    pub display_name: String,
    pub joined_at: OffsetDateTime,
}

/// A round to open. Its number is assigned by the backend as the session's
/// next `current_round`.
#[derive(Debug, Clone)]
pub struct NewRound {
    pub id: String,
    pub image_url: String,
    pub starts_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewCaption {
    pub id: String,
    pub player_id: String,
    pub display_name: String,
    pub text: String,
    pub submitted_at: OffsetDateTime,
}

/// Result of [`Storage::finalize_reveal`].
#[derive(Debug, Clone)]
pub struct RevealedRound {
    pub session: Session,
    pub round: Round,
    /// Captions that received a score.
    pub scored: usize,
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Create a session in `lobby` together with its host (join order 0).
    /// Fails with `Duplicate` when the code is taken.
    async fn insert_session(
        &self,
        session: NewSession,
        host: NewPlayer,
    ) -> Result<Session, StorageError>;

    async fn find_session(&self, code: &str) -> Result<Option<Session>, StorageError>;

    async fn update_session_status(
        &self,
        code: &str,
        status: SessionStatus,
    ) -> Result<Option<Session>, StorageError>;

    /// Append a non-host player; join order is assigned by the backend.
    async fn insert_player(
        &self,
        code: &str,
        player: NewPlayer,
    ) -> Result<Option<Player>, StorageError>;

    /// Players in join order, host first.
    async fn list_players(&self, code: &str) -> Result<Vec<Player>, StorageError>;

    async fn find_player(
        &self,
        code: &str,
        player_id: &str,
    ) -> Result<Option<Player>, StorageError>;

    /// Advance `current_round`, open a round with that number, and move the
    /// session to `status`. Fails with `Duplicate` while another round is
    /// still active.
    async fn open_round(
        &self,
        code: &str,
        round: NewRound,
        status: SessionStatus,
    ) -> Result<Option<(Session, Round)>, StorageError>;

    async fn find_round(&self, code: &str, round_id: &str) -> Result<Option<Round>, StorageError>;

    async fn active_round(&self, code: &str) -> Result<Option<Round>, StorageError>;

    /// Attach scores (keyed by player id) to the round's unscored captions,
    /// flip the round to `revealed`, and move the session to `status`.
    /// Fails with `Duplicate` when the round was already revealed.
    async fn finalize_reveal(
        &self,
        code: &str,
        round_id: &str,
        scores: &[(String, Score)],
        ended_at: OffsetDateTime,
        status: SessionStatus,
    ) -> Result<Option<RevealedRound>, StorageError>;

    /// Insert-if-absent on (round, player). Returns `Ok(None)` when the
    /// round does not belong to the session.
    async fn insert_caption(
        &self,
        code: &str,
        round_id: &str,
        caption: NewCaption,
    ) -> Result<Option<Caption>, StorageError>;

    /// Captions of one round in submission order.
    async fn list_round_captions(
        &self,
        code: &str,
        round_id: &str,
    ) -> Result<Vec<Caption>, StorageError>;

    async fn list_session_captions(&self, code: &str) -> Result<Vec<Caption>, StorageError>;

    async fn count_round_captions(&self, code: &str, round_id: &str)
        -> Result<usize, StorageError>;

    /// Remove every session with `expires_at <= now`, cascading to its
    /// players, rounds, and captions.
    async fn delete_expired(&self, now: OffsetDateTime) -> Result<u64, StorageError>;

    async fn delete_session(&self, code: &str) -> Result<bool, StorageError>;
}
