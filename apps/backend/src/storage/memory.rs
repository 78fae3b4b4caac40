//! In-memory backend. One mutex guards the whole table set, so every
//! primitive runs as a single critical section.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use time::OffsetDateTime;

use super::{NewCaption, NewPlayer, NewRound, NewSession, RevealedRound, Storage, StorageError};
use crate::domain::model::{Caption, Player, Round, RoundStatus, Score, Session};
use crate::domain::SessionStatus;

struct SessionRecord {
    session: Session,
    players: Vec<Player>,
    rounds: Vec<Round>,
    captions: Vec<Caption>,
}

impl SessionRecord {
    fn round(&self, round_id: &str) -> Option<&Round> {
        self.rounds.iter().find(|r| r.id == round_id)
    }
}

#[derive(Default)]
pub struct InMemoryStorage {
    sessions: Mutex<HashMap<String, SessionRecord>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_record<T>(&self, code: &str, f: impl FnOnce(&mut SessionRecord) -> T) -> Option<T> {
        let mut sessions = self.sessions.lock();
        sessions.get_mut(code).map(f)
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn insert_session(
        &self,
        session: NewSession,
        host: NewPlayer,
    ) -> Result<Session, StorageError> {
        let mut sessions = self.sessions.lock();
        if sessions.contains_key(&session.code) {
            return Err(StorageError::Duplicate(format!(
                "session code {}",
                session.code
            )));
        }

        let host = Player {
            id: host.id,
            display_name: host.display_name,
            is_host: true,
            join_order: 0,
            joined_at: host.joined_at,
        };
        let created = Session {
            id: session.id,
            code: session.code.clone(),
            status: SessionStatus::Lobby,
            host_player_id: host.id.clone(),
            settings: session.settings,
            current_round: 0,
            created_at: session.created_at,
            expires_at: session.expires_at,
        };
        sessions.insert(
            session.code,
            SessionRecord {
                session: created.clone(),
                players: vec![host],
                rounds: Vec::new(),
                captions: Vec::new(),
            },
        );
        Ok(created)
    }

    async fn find_session(&self, code: &str) -> Result<Option<Session>, StorageError> {
        Ok(self.with_record(code, |rec| rec.session.clone()))
    }

    async fn update_session_status(
        &self,
        code: &str,
        status: SessionStatus,
    ) -> Result<Option<Session>, StorageError> {
        Ok(self.with_record(code, |rec| {
            rec.session.status = status;
            rec.session.clone()
        }))
    }

    async fn insert_player(
        &self,
        code: &str,
        player: NewPlayer,
    ) -> Result<Option<Player>, StorageError> {
        Ok(self.with_record(code, |rec| {
            let join_order = rec
                .players
                .iter()
                .map(|p| p.join_order + 1)
                .max()
                .unwrap_or(0);
            let player = Player {
                id: player.id,
                display_name: player.display_name,
                is_host: false,
                join_order,
                joined_at: player.joined_at,
            };
            rec.players.push(player.clone());
            player
        }))
    }

    async fn list_players(&self, code: &str) -> Result<Vec<Player>, StorageError> {
        Ok(self
            .with_record(code, |rec| {
                let mut players = rec.players.clone();
                players.sort_by_key(|p| p.join_order);
                players
            })
            .unwrap_or_default())
    }

    async fn find_player(
        &self,
        code: &str,
        player_id: &str,
    ) -> Result<Option<Player>, StorageError> {
        Ok(self
            .with_record(code, |rec| {
                rec.players.iter().find(|p| p.id == player_id).cloned()
            })
            .flatten())
    }

    async fn open_round(
        &self,
        code: &str,
        round: NewRound,
        status: SessionStatus,
    ) -> Result<Option<(Session, Round)>, StorageError> {
        self.with_record(code, |rec| {
            if rec.rounds.iter().any(|r| r.status != RoundStatus::Revealed) {
                return Err(StorageError::Duplicate("active round".into()));
            }
            let number = rec.session.current_round + 1;
            if rec.rounds.iter().any(|r| r.number == number) {
                return Err(StorageError::Duplicate(format!("round {number}")));
            }
            let round = Round {
                id: round.id,
                number,
                image_url: round.image_url,
                status: RoundStatus::Active,
                starts_at: round.starts_at,
                ends_at: None,
            };
            rec.rounds.push(round.clone());
            rec.session.current_round = number;
            rec.session.status = status;
            Ok((rec.session.clone(), round))
        })
        .transpose()
    }

    async fn find_round(&self, code: &str, round_id: &str) -> Result<Option<Round>, StorageError> {
        Ok(self
            .with_record(code, |rec| rec.round(round_id).cloned())
            .flatten())
    }

    async fn active_round(&self, code: &str) -> Result<Option<Round>, StorageError> {
        Ok(self
            .with_record(code, |rec| {
                rec.rounds
                    .iter()
                    .find(|r| r.status != RoundStatus::Revealed)
                    .cloned()
            })
            .flatten())
    }

    async fn finalize_reveal(
        &self,
        code: &str,
        round_id: &str,
        scores: &[(String, Score)],
        ended_at: OffsetDateTime,
        status: SessionStatus,
    ) -> Result<Option<RevealedRound>, StorageError> {
        self.with_record(code, |rec| {
            let Some(idx) = rec.rounds.iter().position(|r| r.id == round_id) else {
                return Ok(None);
            };
            if rec.rounds[idx].status == RoundStatus::Revealed {
                return Err(StorageError::Duplicate(format!("reveal of round {round_id}")));
            }

            let mut scored = 0;
            for caption in rec
                .captions
                .iter_mut()
                .filter(|c| c.round_id == round_id && c.score.is_none())
            {
                if let Some((_, score)) = scores.iter().find(|(id, _)| *id == caption.player_id) {
                    caption.score = Some(score.clone());
                    scored += 1;
                }
            }

            let round = &mut rec.rounds[idx];
            round.status = RoundStatus::Revealed;
            round.ends_at = Some(ended_at);
            let round = round.clone();
            rec.session.status = status;
            Ok(Some(RevealedRound {
                session: rec.session.clone(),
                round,
                scored,
            }))
        })
        .unwrap_or(Ok(None))
    }

    async fn insert_caption(
        &self,
        code: &str,
        round_id: &str,
        caption: NewCaption,
    ) -> Result<Option<Caption>, StorageError> {
        self.with_record(code, |rec| {
            if rec.round(round_id).is_none() {
                return Ok(None);
            }
            if rec
                .captions
                .iter()
                .any(|c| c.round_id == round_id && c.player_id == caption.player_id)
            {
                return Err(StorageError::Duplicate(format!(
                    "caption for player {} in round {round_id}",
                    caption.player_id
                )));
            }
            let caption = Caption {
                id: caption.id,
                round_id: round_id.to_string(),
                player_id: caption.player_id,
                display_name: caption.display_name,
                text: caption.text,
                submitted_at: caption.submitted_at,
                score: None,
            };
            rec.captions.push(caption.clone());
            Ok(Some(caption))
        })
        .unwrap_or(Ok(None))
    }

    async fn list_round_captions(
        &self,
        code: &str,
        round_id: &str,
    ) -> Result<Vec<Caption>, StorageError> {
        Ok(self
            .with_record(code, |rec| {
                rec.captions
                    .iter()
                    .filter(|c| c.round_id == round_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_session_captions(&self, code: &str) -> Result<Vec<Caption>, StorageError> {
        Ok(self
            .with_record(code, |rec| rec.captions.clone())
            .unwrap_or_default())
    }

    async fn count_round_captions(
        &self,
        code: &str,
        round_id: &str,
    ) -> Result<usize, StorageError> {
        Ok(self
            .with_record(code, |rec| {
                rec.captions.iter().filter(|c| c.round_id == round_id).count()
            })
            .unwrap_or(0))
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> Result<u64, StorageError> {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, rec| !rec.session.is_expired_at(now));
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_session(&self, code: &str) -> Result<bool, StorageError> {
        Ok(self.sessions.lock().remove(code).is_some())
    }
}
