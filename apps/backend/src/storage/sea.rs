//! Relational backend over sea-orm (sqlite or postgres).
//!
//! Uniqueness comes from the schema's unique indexes; the backend never
//! checks for an existing row before inserting one. Constraint violations
//! surface as `StorageError::Duplicate`. Multi-row writes run inside one
//! transaction; an early return drops it and rolls everything back.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use time::OffsetDateTime;
use tracing::warn;

use super::{NewCaption, NewPlayer, NewRound, NewSession, RevealedRound, Storage, StorageError};
use crate::domain::model::{
    Caption, Player, Round, RoundStatus, Score, Session, SessionSettings,
};
use crate::domain::SessionStatus;
use crate::entities::{captions, players, rounds, sessions};

pub struct SeaStorage {
    db: DatabaseConnection,
}

impl SeaStorage {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Translate a `DbErr` into the storage taxonomy.
fn map_db_err(err: DbErr) -> StorageError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        return StorageError::Duplicate(detail);
    }
    match &err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => {
            warn!(error = %err, "Database unavailable");
            StorageError::Unavailable("database unavailable".into())
        }
        _ => {
            let msg = err.to_string();
            // Some drivers only report uniqueness in the message text.
            if msg.contains("UNIQUE constraint failed")
                || msg.contains("duplicate key value violates unique constraint")
            {
                StorageError::Duplicate(msg)
            } else {
                StorageError::Backend(msg)
            }
        }
    }
}

fn corrupt(what: &str, detail: impl std::fmt::Display) -> StorageError {
    StorageError::Corrupt(format!("{what}: {detail}"))
}

fn non_negative(what: &str, value: i32) -> Result<u32, StorageError> {
    u32::try_from(value).map_err(|_| corrupt(what, value))
}

fn session_from_row(row: sessions::Model) -> Result<Session, StorageError> {
    let status =
        SessionStatus::parse(&row.status).ok_or_else(|| corrupt("session status", &row.status))?;
    let rounds_total = u8::try_from(row.rounds_total)
        .map_err(|_| corrupt("rounds_total", row.rounds_total))?;
    let settings =
        SessionSettings::new(rounds_total).map_err(|e| corrupt("session settings", e))?;
    Ok(Session {
        id: row.id,
        code: row.code,
        status,
        host_player_id: row.host_player_id,
        settings,
        current_round: non_negative("current_round", row.current_round)?,
        created_at: row.created_at,
        expires_at: row.expires_at,
    })
}

fn player_from_row(row: players::Model) -> Result<Player, StorageError> {
    Ok(Player {
        id: row.id,
        display_name: row.display_name,
        is_host: row.is_host,
        join_order: non_negative("join_order", row.join_order)?,
        joined_at: row.joined_at,
    })
}

fn round_from_row(row: rounds::Model) -> Result<Round, StorageError> {
    let status =
        RoundStatus::parse(&row.status).ok_or_else(|| corrupt("round status", &row.status))?;
    Ok(Round {
        id: row.id,
        number: non_negative("round number", row.number)?,
        image_url: row.image_url,
        status,
        starts_at: row.starts_at,
        ends_at: row.ends_at,
    })
}

fn caption_from_row(row: captions::Model) -> Result<Caption, StorageError> {
    let score = match (row.humour, row.relevance, row.total) {
        (Some(humour), Some(relevance), Some(total)) => {
            let component = |what: &str, v: i16| u8::try_from(v).map_err(|_| corrupt(what, v));
            Some(Score {
                humour: component("humour", humour)?,
                relevance: component("relevance", relevance)?,
                total: component("total", total)?,
                roast: row.roast.unwrap_or_default(),
            })
        }
        (None, None, None) => None,
        _ => return Err(corrupt("caption score", &row.id)),
    };
    Ok(Caption {
        id: row.id,
        round_id: row.round_id,
        player_id: row.player_id,
        display_name: row.display_name,
        text: row.text,
        submitted_at: row.submitted_at,
        score,
    })
}

async fn session_row<C: ConnectionTrait>(
    conn: &C,
    code: &str,
) -> Result<Option<sessions::Model>, StorageError> {
    sessions::Entity::find()
        .filter(sessions::Column::Code.eq(code))
        .one(conn)
        .await
        .map_err(map_db_err)
}

async fn round_row<C: ConnectionTrait>(
    conn: &C,
    session_id: &str,
    round_id: &str,
) -> Result<Option<rounds::Model>, StorageError> {
    rounds::Entity::find()
        .filter(rounds::Column::Id.eq(round_id))
        .filter(rounds::Column::SessionId.eq(session_id))
        .one(conn)
        .await
        .map_err(map_db_err)
}

/// Delete the given sessions and everything under them.
async fn delete_sessions<C: ConnectionTrait>(
    conn: &C,
    session_ids: Vec<String>,
) -> Result<u64, StorageError> {
    if session_ids.is_empty() {
        return Ok(0);
    }
    captions::Entity::delete_many()
        .filter(captions::Column::SessionId.is_in(session_ids.clone()))
        .exec(conn)
        .await
        .map_err(map_db_err)?;
    rounds::Entity::delete_many()
        .filter(rounds::Column::SessionId.is_in(session_ids.clone()))
        .exec(conn)
        .await
        .map_err(map_db_err)?;
    players::Entity::delete_many()
        .filter(players::Column::SessionId.is_in(session_ids.clone()))
        .exec(conn)
        .await
        .map_err(map_db_err)?;
    let result = sessions::Entity::delete_many()
        .filter(sessions::Column::Id.is_in(session_ids))
        .exec(conn)
        .await
        .map_err(map_db_err)?;
    Ok(result.rows_affected)
}

#[async_trait]
impl Storage for SeaStorage {
    async fn insert_session(
        &self,
        session: NewSession,
        host: NewPlayer,
    ) -> Result<Session, StorageError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let row = sessions::ActiveModel {
            id: Set(session.id),
            code: Set(session.code),
            status: Set(SessionStatus::Lobby.as_str().to_string()),
            host_player_id: Set(host.id.clone()),
            rounds_total: Set(i16::from(session.settings.rounds_total)),
            current_round: Set(0),
            created_at: Set(session.created_at),
            expires_at: Set(session.expires_at),
        }
        .insert(&txn)
        .await
        .map_err(map_db_err)?;

        players::ActiveModel {
            id: Set(host.id),
            session_id: Set(row.id.clone()),
            display_name: Set(host.display_name),
            is_host: Set(true),
            join_order: Set(0),
            joined_at: Set(host.joined_at),
        }
        .insert(&txn)
        .await
        .map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;
        session_from_row(row)
    }

    async fn find_session(&self, code: &str) -> Result<Option<Session>, StorageError> {
        session_row(&self.db, code)
            .await?
            .map(session_from_row)
            .transpose()
    }

    async fn update_session_status(
        &self,
        code: &str,
        status: SessionStatus,
    ) -> Result<Option<Session>, StorageError> {
        sessions::Entity::update_many()
            .col_expr(sessions::Column::Status, Expr::value(status.as_str()))
            .filter(sessions::Column::Code.eq(code))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        self.find_session(code).await
    }

    async fn insert_player(
        &self,
        code: &str,
        player: NewPlayer,
    ) -> Result<Option<Player>, StorageError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        let Some(session) = session_row(&txn, code).await? else {
            return Ok(None);
        };

        let last = players::Entity::find()
            .filter(players::Column::SessionId.eq(session.id.as_str()))
            .order_by_desc(players::Column::JoinOrder)
            .one(&txn)
            .await
            .map_err(map_db_err)?;
        let join_order = last.map_or(0, |p| p.join_order + 1);

        // ux_players_session_join_order rejects a concurrent join that read the same tail.
        let row = players::ActiveModel {
            id: Set(player.id),
            session_id: Set(session.id),
            display_name: Set(player.display_name),
            is_host: Set(false),
            join_order: Set(join_order),
            joined_at: Set(player.joined_at),
        }
        .insert(&txn)
        .await
        .map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;
        player_from_row(row).map(Some)
    }

    async fn list_players(&self, code: &str) -> Result<Vec<Player>, StorageError> {
        let Some(session) = session_row(&self.db, code).await? else {
            return Ok(Vec::new());
        };
        players::Entity::find()
            .filter(players::Column::SessionId.eq(session.id))
            .order_by_asc(players::Column::JoinOrder)
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(player_from_row)
            .collect()
    }

    async fn find_player(
        &self,
        code: &str,
        player_id: &str,
    ) -> Result<Option<Player>, StorageError> {
        let Some(session) = session_row(&self.db, code).await? else {
            return Ok(None);
        };
        players::Entity::find()
            .filter(players::Column::Id.eq(player_id))
            .filter(players::Column::SessionId.eq(session.id))
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(player_from_row)
            .transpose()
    }

    async fn open_round(
        &self,
        code: &str,
        round: NewRound,
        status: SessionStatus,
    ) -> Result<Option<(Session, Round)>, StorageError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        let Some(session) = session_row(&txn, code).await? else {
            return Ok(None);
        };

        let active = rounds::Entity::find()
            .filter(rounds::Column::SessionId.eq(session.id.as_str()))
            .filter(rounds::Column::Status.ne(RoundStatus::Revealed.as_str()))
            .count(&txn)
            .await
            .map_err(map_db_err)?;
        if active > 0 {
            return Err(StorageError::Duplicate("active round".into()));
        }

        let number = session.current_round + 1;
        // ux_rounds_session_number rejects a concurrent open that read the same counter.
        let row = rounds::ActiveModel {
            id: Set(round.id),
            session_id: Set(session.id.clone()),
            number: Set(number),
            image_url: Set(round.image_url),
            status: Set(RoundStatus::Active.as_str().to_string()),
            starts_at: Set(round.starts_at),
            ends_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(map_db_err)?;

        sessions::Entity::update_many()
            .col_expr(sessions::Column::CurrentRound, Expr::value(number))
            .col_expr(sessions::Column::Status, Expr::value(status.as_str()))
            .filter(sessions::Column::Id.eq(session.id.as_str()))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        let session = session_row(&txn, code)
            .await?
            .ok_or_else(|| corrupt("session vanished mid-transaction", code))?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(Some((session_from_row(session)?, round_from_row(row)?)))
    }

    async fn find_round(&self, code: &str, round_id: &str) -> Result<Option<Round>, StorageError> {
        let Some(session) = session_row(&self.db, code).await? else {
            return Ok(None);
        };
        round_row(&self.db, &session.id, round_id)
            .await?
            .map(round_from_row)
            .transpose()
    }

    async fn active_round(&self, code: &str) -> Result<Option<Round>, StorageError> {
        let Some(session) = session_row(&self.db, code).await? else {
            return Ok(None);
        };
        rounds::Entity::find()
            .filter(rounds::Column::SessionId.eq(session.id))
            .filter(rounds::Column::Status.ne(RoundStatus::Revealed.as_str()))
            .order_by_desc(rounds::Column::Number)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(round_from_row)
            .transpose()
    }

    async fn finalize_reveal(
        &self,
        code: &str,
        round_id: &str,
        scores: &[(String, Score)],
        ended_at: OffsetDateTime,
        status: SessionStatus,
    ) -> Result<Option<RevealedRound>, StorageError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        let Some(session) = session_row(&txn, code).await? else {
            return Ok(None);
        };
        if round_row(&txn, &session.id, round_id).await?.is_none() {
            return Ok(None);
        }

        let flipped = rounds::Entity::update_many()
            .col_expr(
                rounds::Column::Status,
                Expr::value(RoundStatus::Revealed.as_str()),
            )
            .col_expr(rounds::Column::EndsAt, Expr::value(ended_at))
            .filter(rounds::Column::Id.eq(round_id))
            .filter(rounds::Column::SessionId.eq(session.id.as_str()))
            .filter(rounds::Column::Status.ne(RoundStatus::Revealed.as_str()))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        if flipped.rows_affected == 0 {
            return Err(StorageError::Duplicate(format!("reveal of round {round_id}")));
        }

        let mut scored = 0;
        for (player_id, score) in scores {
            // The `total IS NULL` guard keeps scoring exactly-once.
            let result = captions::Entity::update_many()
                .col_expr(captions::Column::Humour, Expr::value(i16::from(score.humour)))
                .col_expr(
                    captions::Column::Relevance,
                    Expr::value(i16::from(score.relevance)),
                )
                .col_expr(captions::Column::Total, Expr::value(i16::from(score.total)))
                .col_expr(captions::Column::Roast, Expr::value(score.roast.clone()))
                .filter(captions::Column::SessionId.eq(session.id.as_str()))
                .filter(captions::Column::RoundId.eq(round_id))
                .filter(captions::Column::PlayerId.eq(player_id.as_str()))
                .filter(captions::Column::Total.is_null())
                .exec(&txn)
                .await
                .map_err(map_db_err)?;
            scored += result.rows_affected as usize;
        }

        sessions::Entity::update_many()
            .col_expr(sessions::Column::Status, Expr::value(status.as_str()))
            .filter(sessions::Column::Id.eq(session.id.as_str()))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        let session_after = session_row(&txn, code)
            .await?
            .ok_or_else(|| corrupt("session vanished mid-transaction", code))?;
        let round = round_row(&txn, &session.id, round_id)
            .await?
            .ok_or_else(|| corrupt("round vanished mid-transaction", round_id))?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(Some(RevealedRound {
            session: session_from_row(session_after)?,
            round: round_from_row(round)?,
            scored,
        }))
    }

    async fn insert_caption(
        &self,
        code: &str,
        round_id: &str,
        caption: NewCaption,
    ) -> Result<Option<Caption>, StorageError> {
        let Some(session) = session_row(&self.db, code).await? else {
            return Ok(None);
        };
        if round_row(&self.db, &session.id, round_id).await?.is_none() {
            return Ok(None);
        }

        // ux_captions_round_player makes this an insert-if-absent.
        let row = captions::ActiveModel {
            id: Set(caption.id),
            session_id: Set(session.id),
            round_id: Set(round_id.to_string()),
            player_id: Set(caption.player_id),
            display_name: Set(caption.display_name),
            text: Set(caption.text),
            submitted_at: Set(caption.submitted_at),
            humour: Set(None),
            relevance: Set(None),
            total: Set(None),
            roast: Set(None),
        }
        .insert(&self.db)
        .await
        .map_err(map_db_err)?;

        caption_from_row(row).map(Some)
    }

    async fn list_round_captions(
        &self,
        code: &str,
        round_id: &str,
    ) -> Result<Vec<Caption>, StorageError> {
        let Some(session) = session_row(&self.db, code).await? else {
            return Ok(Vec::new());
        };
        captions::Entity::find()
            .filter(captions::Column::SessionId.eq(session.id))
            .filter(captions::Column::RoundId.eq(round_id))
            .order_by_asc(captions::Column::SubmittedAt)
            .order_by_asc(captions::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(caption_from_row)
            .collect()
    }

    async fn list_session_captions(&self, code: &str) -> Result<Vec<Caption>, StorageError> {
        let Some(session) = session_row(&self.db, code).await? else {
            return Ok(Vec::new());
        };
        captions::Entity::find()
            .filter(captions::Column::SessionId.eq(session.id))
            .order_by_asc(captions::Column::SubmittedAt)
            .order_by_asc(captions::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(caption_from_row)
            .collect()
    }

    async fn count_round_captions(
        &self,
        code: &str,
        round_id: &str,
    ) -> Result<usize, StorageError> {
        let Some(session) = session_row(&self.db, code).await? else {
            return Ok(0);
        };
        let count = captions::Entity::find()
            .filter(captions::Column::SessionId.eq(session.id))
            .filter(captions::Column::RoundId.eq(round_id))
            .count(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(count as usize)
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> Result<u64, StorageError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        let expired: Vec<String> = sessions::Entity::find()
            .filter(sessions::Column::ExpiresAt.lte(now))
            .all(&txn)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(|row| row.id)
            .collect();
        let deleted = delete_sessions(&txn, expired).await?;
        txn.commit().await.map_err(map_db_err)?;
        Ok(deleted)
    }

    async fn delete_session(&self, code: &str) -> Result<bool, StorageError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        let Some(session) = session_row(&txn, code).await? else {
            return Ok(false);
        };
        let deleted = delete_sessions(&txn, vec![session.id]).await?;
        txn.commit().await.map_err(map_db_err)?;
        Ok(deleted > 0)
    }
}
