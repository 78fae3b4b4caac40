//! Session registry: creation, joining, status transitions, and reads.

use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};

use super::session_locks::SessionLocks;
use crate::auth::Authenticator;
use crate::config::GameRules;
use crate::domain::caption_text::validate_display_name;
use crate::domain::leaderboard::compute_leaderboard;
use crate::domain::model::new_id;
use crate::domain::session_code::{generate_session_code, normalize_session_code};
use crate::domain::{
    Caption, LeaderboardEntry, Player, Round, Session, SessionEvent, SessionSettings,
    SessionStatus,
};
use crate::errors::domain::{ConflictKind, DomainError, UnauthorizedKind};
use crate::realtime::{Broadcaster, SessionNotice};
use crate::storage::{NewPlayer, NewSession, Storage};

/// Attempts at finding an unused session code before giving up.
pub const MAX_CODE_ATTEMPTS: usize = 16;

/// A player's view of their own membership.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerCredentials {
    pub session: Session,
    pub player: Player,
    pub token: String,
}

/// Everything a client needs to render a session.
///
/// Captions of the active round are never included; only their count.
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub session: Session,
    pub players: Vec<Player>,
    pub active_round: Option<Round>,
    pub submitted_count: usize,
    pub revealed_captions: Vec<Caption>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

pub struct SessionRegistry {
    storage: Arc<dyn Storage>,
    auth: Arc<dyn Authenticator>,
    broadcaster: Arc<dyn Broadcaster>,
    locks: Arc<SessionLocks>,
    rules: GameRules,
}

impl SessionRegistry {
    pub fn new(
        storage: Arc<dyn Storage>,
        auth: Arc<dyn Authenticator>,
        broadcaster: Arc<dyn Broadcaster>,
        locks: Arc<SessionLocks>,
        rules: GameRules,
    ) -> Self {
        Self {
            storage,
            auth,
            broadcaster,
            locks,
            rules,
        }
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn broadcaster(&self) -> &Arc<dyn Broadcaster> {
        &self.broadcaster
    }

    pub async fn create_session(
        &self,
        host_display_name: &str,
        rounds_total: Option<u8>,
    ) -> Result<PlayerCredentials, DomainError> {
        let display_name = validate_display_name(host_display_name)?;
        let settings = match rounds_total {
            Some(n) => SessionSettings::new(n)?,
            None => self.rules.default_settings,
        };

        let now = OffsetDateTime::now_utc();
        let host_id = new_id("player");

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = generate_session_code();
            let new_session = NewSession {
                id: new_id("session"),
                code: code.clone(),
                settings,
                created_at: now,
                expires_at: now + self.rules.session_ttl,
            };
            let host = NewPlayer {
                id: host_id.clone(),
                display_name: display_name.clone(),
                joined_at: now,
            };

            match self.storage.insert_session(new_session, host).await {
                Ok(session) => {
                    let player = self
                        .storage
                        .find_player(&session.code, &host_id)
                        .await?
                        .ok_or_else(|| DomainError::session_not_found(&session.code))?;
                    let token = self.auth.issue(&player.id, &session.code)?;
                    info!(
                        session_code = %session.code,
                        rounds_total = settings.rounds_total,
                        "Session created"
                    );
                    return Ok(PlayerCredentials {
                        session,
                        player,
                        token,
                    });
                }
                Err(err) if err.is_duplicate() => {
                    warn!(attempt, session_code = %code, "Session code collision; regenerating");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(DomainError::conflict(
            ConflictKind::SessionCodeExhausted,
            format!("No free session code after {MAX_CODE_ATTEMPTS} attempts"),
        ))
    }

    pub async fn join_session(
        &self,
        code: &str,
        display_name: &str,
    ) -> Result<PlayerCredentials, DomainError> {
        let code = normalize_session_code(code)?;
        let display_name = validate_display_name(display_name)?;

        let _guard = self.lock(&code).await;
        let session = self.load_live(&code).await?;
        if !session.status.accepts_players() {
            return Err(DomainError::conflict(
                ConflictKind::IllegalTransition,
                format!("Session is {}", session.status.as_str()),
            ));
        }

        let player = self
            .storage
            .insert_player(
                &code,
                NewPlayer {
                    id: new_id("player"),
                    display_name,
                    joined_at: OffsetDateTime::now_utc(),
                },
            )
            .await?
            .ok_or_else(|| DomainError::session_not_found(&code))?;
        let player_count = self.storage.list_players(&code).await?.len();
        let token = self.auth.issue(&player.id, &code)?;

        info!(session_code = %code, player_id = %player.id, player_count, "Player joined");
        self.broadcaster.notify(
            &code,
            SessionNotice::PlayerJoined {
                player_id: player.id.clone(),
                display_name: player.display_name.clone(),
                player_count,
            },
        );

        Ok(PlayerCredentials {
            session,
            player,
            token,
        })
    }

    pub async fn get_state(&self, code: &str) -> Result<SessionState, DomainError> {
        let code = normalize_session_code(code)?;
        let session = self.load_live(&code).await?;
        let players = self.storage.list_players(&code).await?;
        let active_round = self.storage.active_round(&code).await?;
        let captions = self.storage.list_session_captions(&code).await?;
        let leaderboard = compute_leaderboard(&players, &captions);

        // Unlocked read. A round may open between the reads above, so only a
        // caption's own score (written together with the reveal) exposes it.
        let active_id = active_round.as_ref().map(|r| r.id.as_str());
        let (revealed_captions, pending): (Vec<Caption>, Vec<Caption>) =
            captions.into_iter().partition(|c| c.score.is_some());
        let submitted_count = pending
            .iter()
            .filter(|c| Some(c.round_id.as_str()) == active_id)
            .count();

        Ok(SessionState {
            session,
            players,
            active_round,
            submitted_count,
            revealed_captions,
            leaderboard,
        })
    }

    /// Host-only: finish the session from any non-terminal status.
    pub async fn end_session(&self, code: &str, token: &str) -> Result<Session, DomainError> {
        let code = normalize_session_code(code)?;
        let _guard = self.lock(&code).await;
        let session = self.load_live(&code).await?;
        self.require_host(&session, token)?;

        let session = self.update_status(&session, SessionEvent::End).await?;
        let players = self.storage.list_players(&code).await?;
        let captions = self.storage.list_session_captions(&code).await?;
        let leaderboard = compute_leaderboard(&players, &captions);

        info!(session_code = %code, "Session ended by host");
        self.broadcaster
            .notify(&code, SessionNotice::SessionFinished { leaderboard });
        Ok(session)
    }

    /// Acquire the per-session serialization lock.
    pub(crate) async fn lock(&self, code: &str) -> OwnedMutexGuard<()> {
        self.locks.acquire(code).await
    }

    /// Load a session that exists and has not passed its expiry.
    pub(crate) async fn load_live(&self, code: &str) -> Result<Session, DomainError> {
        match self.storage.find_session(code).await? {
            Some(session) if !session.is_expired_at(OffsetDateTime::now_utc()) => Ok(session),
            _ => Err(DomainError::session_not_found(code)),
        }
    }

    /// Resolve a token to a player of this session.
    pub(crate) async fn authorize(&self, code: &str, token: &str) -> Result<Player, DomainError> {
        let player_id = self.auth.verify(token, code).ok_or_else(|| {
            DomainError::unauthorized(UnauthorizedKind::InvalidToken, "Invalid or expired token")
        })?;
        self.storage
            .find_player(code, &player_id)
            .await?
            .ok_or_else(|| {
                DomainError::unauthorized(
                    UnauthorizedKind::NotMember,
                    "Token does not belong to a player of this session",
                )
            })
    }

    pub(crate) fn require_host(&self, session: &Session, token: &str) -> Result<(), DomainError> {
        match self.auth.verify(token, &session.code) {
            Some(player_id) if player_id == session.host_player_id => Ok(()),
            Some(_) => Err(DomainError::unauthorized(
                UnauthorizedKind::NotHost,
                "Only the host can do that",
            )),
            None => Err(DomainError::unauthorized(
                UnauthorizedKind::InvalidToken,
                "Invalid or expired token",
            )),
        }
    }

    /// The only place session status changes. Callers must hold the
    /// session lock.
    pub(crate) async fn update_status(
        &self,
        session: &Session,
        event: SessionEvent,
    ) -> Result<Session, DomainError> {
        let next: SessionStatus = session.status.apply(event)?;
        self.storage
            .update_session_status(&session.code, next)
            .await?
            .ok_or_else(|| DomainError::session_not_found(&session.code))
    }
}
