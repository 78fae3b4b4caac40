//! Round lifecycle: start, caption submission, and reveal.

use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use super::sessions::SessionRegistry;
use crate::config::RevealPolicy;
use crate::domain::caption_text::validate_caption;
use crate::domain::leaderboard::compute_leaderboard;
use crate::domain::model::new_id;
use crate::domain::reconcile::{fallback_all, reconcile, ReconciledScore, ScoreSource, Submission};
use crate::domain::session_code::normalize_session_code;
use crate::domain::{Caption, LeaderboardEntry, Round, Session, SessionEvent, SessionStatus};
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};
use crate::images::{ImageSource, PLACEHOLDER_IMAGE_URL};
use crate::judge::{CaptionForJudging, Judge};
use crate::realtime::SessionNotice;
use crate::storage::{NewCaption, NewRound, RevealedRound};

#[derive(Debug, Clone, Serialize)]
pub struct SubmittedCaption {
    pub caption_id: String,
    pub round_id: String,
    pub submitted: usize,
    pub player_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevealOutcome {
    pub session: Session,
    pub round: Round,
    pub captions: Vec<Caption>,
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Captions scored by the fallback scorer instead of the judge.
    pub fallback_count: usize,
}

#[derive(Clone)]
pub struct RoundCoordinator {
    registry: Arc<SessionRegistry>,
    images: Arc<dyn ImageSource>,
    judge: Arc<dyn Judge>,
}

impl RoundCoordinator {
    pub fn new(
        registry: Arc<SessionRegistry>,
        images: Arc<dyn ImageSource>,
        judge: Arc<dyn Judge>,
    ) -> Self {
        Self {
            registry,
            images,
            judge,
        }
    }

    /// Host-only: open the next round.
    pub async fn start_round(&self, code: &str, token: &str) -> Result<Round, DomainError> {
        let code = normalize_session_code(code)?;
        let storage = self.registry.storage();

        let _guard = self.registry.lock(&code).await;
        let session = self.registry.load_live(&code).await?;
        self.registry.require_host(&session, token)?;
        let next = session.status.apply(SessionEvent::StartRound)?;
        if session.is_last_round() {
            return Err(DomainError::conflict(
                ConflictKind::RoundsExhausted,
                format!(
                    "All {} rounds have been played",
                    session.settings.rounds_total
                ),
            ));
        }

        let image_url = match self.images.fetch_image_reference().await {
            Ok(url) => url,
            Err(err) => {
                warn!(session_code = %code, error = %err, "Image source failed; using placeholder");
                PLACEHOLDER_IMAGE_URL.to_string()
            }
        };

        let (_, round) = storage
            .open_round(
                &code,
                NewRound {
                    id: new_id("round"),
                    image_url,
                    starts_at: OffsetDateTime::now_utc(),
                },
                next,
            )
            .await?
            .ok_or_else(|| DomainError::session_not_found(&code))?;

        info!(session_code = %code, round_id = %round.id, number = round.number, "Round started");
        self.registry.broadcaster().notify(
            &code,
            SessionNotice::RoundStarted {
                round_id: round.id.clone(),
                number: round.number,
                image_url: round.image_url.clone(),
            },
        );
        Ok(round)
    }

    /// Store a player's caption for the active round. At most one caption
    /// per (round, player) ever succeeds.
    pub async fn submit_caption(
        &self,
        code: &str,
        round_id: &str,
        token: &str,
        text: &str,
    ) -> Result<SubmittedCaption, DomainError> {
        let code = normalize_session_code(code)?;
        let text = validate_caption(text, self.registry.rules().max_caption_words)?;
        let storage = self.registry.storage();

        let outcome = {
            let _guard = self.registry.lock(&code).await;
            let session = self.registry.load_live(&code).await?;
            let player = self.registry.authorize(&code, token).await?;
            if !session.status.accepts_captions() {
                return Err(DomainError::conflict(
                    ConflictKind::IllegalTransition,
                    format!(
                        "Captions are closed while session is {}",
                        session.status.as_str()
                    ),
                ));
            }
            self.require_active_round(&code, round_id).await?;

            let caption = storage
                .insert_caption(
                    &code,
                    round_id,
                    NewCaption {
                        id: new_id("caption"),
                        player_id: player.id.clone(),
                        display_name: player.display_name.clone(),
                        text,
                        submitted_at: OffsetDateTime::now_utc(),
                    },
                )
                .await
                .map_err(|err| {
                    if err.is_duplicate() {
                        DomainError::conflict(
                            ConflictKind::DuplicateSubmission,
                            "Caption already submitted for this round",
                        )
                    } else {
                        err.into()
                    }
                })?
                .ok_or_else(|| {
                    DomainError::not_found(NotFoundKind::Round, format!("Round {round_id} not found"))
                })?;

            SubmittedCaption {
                caption_id: caption.id,
                round_id: round_id.to_string(),
                submitted: storage.count_round_captions(&code, round_id).await?,
                player_count: storage.list_players(&code).await?.len(),
            }
        };

        debug!(
            session_code = %code,
            round_id,
            submitted = outcome.submitted,
            player_count = outcome.player_count,
            "Caption submitted"
        );
        self.registry.broadcaster().notify(
            &code,
            SessionNotice::CaptionSubmitted {
                round_id: outcome.round_id.clone(),
                submitted: outcome.submitted,
                player_count: outcome.player_count,
            },
        );

        if self.registry.rules().reveal_policy == RevealPolicy::AutoWhenAllSubmitted
            && outcome.submitted >= outcome.player_count
        {
            self.spawn_auto_reveal(code, round_id.to_string());
        }

        Ok(outcome)
    }

    /// Host-only: score the round and publish the results.
    pub async fn reveal_round(
        &self,
        code: &str,
        round_id: &str,
        token: &str,
    ) -> Result<RevealOutcome, DomainError> {
        let code = normalize_session_code(code)?;
        let _guard = self.registry.lock(&code).await;
        let session = self.registry.load_live(&code).await?;
        self.registry.require_host(&session, token)?;
        self.reveal_locked(session, round_id).await
    }

    fn spawn_auto_reveal(&self, code: String, round_id: String) {
        let this = self.clone();
        tokio::spawn(async move {
            let _guard = this.registry.lock(&code).await;
            let session = match this.registry.load_live(&code).await {
                Ok(session) => session,
                Err(err) => {
                    debug!(session_code = %code, error = %err, "Auto-reveal skipped");
                    return;
                }
            };
            match this.reveal_locked(session, &round_id).await {
                Ok(_) => info!(session_code = %code, round_id = %round_id, "Auto-revealed round"),
                // The host got there first.
                Err(err) if err.is_conflict() => {
                    debug!(session_code = %code, round_id = %round_id, "Auto-reveal lost the race")
                }
                Err(err) => {
                    error!(session_code = %code, round_id = %round_id, error = %err, "Auto-reveal failed")
                }
            }
        });
    }

    async fn require_active_round(&self, code: &str, round_id: &str) -> Result<Round, DomainError> {
        let storage = self.registry.storage();
        match storage.active_round(code).await? {
            Some(active) if active.id == round_id => Ok(active),
            _ => match storage.find_round(code, round_id).await? {
                Some(_) => Err(DomainError::conflict(
                    ConflictKind::RoundMismatch,
                    format!("Round {round_id} is not the active round"),
                )),
                None => Err(DomainError::not_found(
                    NotFoundKind::Round,
                    format!("Round {round_id} not found"),
                )),
            },
        }
    }

    /// Reveal with the session lock already held.
    async fn reveal_locked(
        &self,
        session: Session,
        round_id: &str,
    ) -> Result<RevealOutcome, DomainError> {
        let code = session.code.clone();
        let storage = self.registry.storage();

        let next = session.status.apply(SessionEvent::Reveal {
            last_round: session.is_last_round(),
        })?;
        let round = self.require_active_round(&code, round_id).await?;

        let captions = storage.list_round_captions(&code, round_id).await?;
        let submissions: Vec<Submission> = captions
            .iter()
            .map(|c| Submission {
                player_id: c.player_id.clone(),
                display_name: c.display_name.clone(),
                text: c.text.clone(),
            })
            .collect();

        let scores = self.score(&code, &round.image_url, &submissions).await;
        let fallback_count = scores
            .iter()
            .filter(|s| s.source == ScoreSource::Fallback)
            .count();
        let pairs: Vec<(String, _)> = scores
            .into_iter()
            .map(|s| (s.player_id, s.score))
            .collect();
        let RevealedRound { session, round, .. } = storage
            .finalize_reveal(&code, round_id, &pairs, OffsetDateTime::now_utc(), next)
            .await
            .map_err(|err| {
                if err.is_duplicate() {
                    DomainError::conflict(ConflictKind::IllegalTransition, "Round already revealed")
                } else {
                    err.into()
                }
            })?
            .ok_or_else(|| {
                DomainError::not_found(NotFoundKind::Round, format!("Round {round_id} not found"))
            })?;

        let captions = storage.list_round_captions(&code, round_id).await?;
        let players = storage.list_players(&code).await?;
        let all_captions = storage.list_session_captions(&code).await?;
        let leaderboard = compute_leaderboard(&players, &all_captions);

        info!(
            session_code = %code,
            round_id,
            number = round.number,
            scored = captions.len(),
            fallback_count,
            status = session.status.as_str(),
            "Round revealed"
        );

        let broadcaster = self.registry.broadcaster();
        broadcaster.notify(
            &code,
            SessionNotice::RoundRevealed {
                round_id: round.id.clone(),
                number: round.number,
                status: session.status,
                captions: captions.clone(),
                leaderboard: leaderboard.clone(),
            },
        );
        if session.status == SessionStatus::Finished {
            broadcaster.notify(
                &code,
                SessionNotice::SessionFinished {
                    leaderboard: leaderboard.clone(),
                },
            );
        }

        Ok(RevealOutcome {
            session,
            round,
            captions,
            leaderboard,
            fallback_count,
        })
    }

    /// Judge the captions, bounded by the configured timeout. Never fails:
    /// any judge error or timeout degrades to the fallback scorer.
    async fn score(
        &self,
        code: &str,
        image_url: &str,
        submissions: &[Submission],
    ) -> Vec<ReconciledScore> {
        if submissions.is_empty() {
            return Vec::new();
        }

        let for_judge: Vec<CaptionForJudging> = submissions
            .iter()
            .map(|s| CaptionForJudging {
                display_name: s.display_name.clone(),
                text: s.text.clone(),
            })
            .collect();

        let timeout = self.registry.rules().judge_timeout;
        match tokio::time::timeout(timeout, self.judge.judge(image_url, &for_judge)).await {
            Ok(Ok(judged)) => reconcile(submissions, &judged),
            Ok(Err(err)) => {
                warn!(session_code = %code, error = %err, "Judge failed; using fallback scores");
                fallback_all(submissions)
            }
            Err(_) => {
                warn!(
                    session_code = %code,
                    timeout_ms = timeout.as_millis() as u64,
                    "Judge timed out; using fallback scores"
                );
                fallback_all(submissions)
            }
        }
    }
}
