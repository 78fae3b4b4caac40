//! Test doubles for the judge, image source, notice sink, and storage.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cagematch::domain::{Caption, Player, Round, Score, Session, SessionStatus};
use cagematch::images::{ImageSource, ImageSourceError};
use cagematch::judge::{CaptionForJudging, Judge, JudgeError, JudgedCaption};
use cagematch::realtime::{Broadcaster, SessionNotice};
use cagematch::storage::{
    InMemoryStorage, NewCaption, NewPlayer, NewRound, NewSession, RevealedRound, Storage,
    StorageError,
};
use parking_lot::Mutex;
use time::OffsetDateTime;
use tokio::sync::oneshot;

type Script = dyn Fn(&[CaptionForJudging]) -> Vec<JudgedCaption> + Send + Sync;

/// Judge whose output is computed by a closure over its input.
pub struct ScriptedJudge {
    script: Box<Script>,
}

impl ScriptedJudge {
    pub fn new(
        script: impl Fn(&[CaptionForJudging]) -> Vec<JudgedCaption> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
        })
    }

    /// Scores every caption `humour = relevance = words in the caption`.
    pub fn word_counter() -> Arc<Self> {
        Self::new(|captions| captions.iter().map(|c| judged(c, word_score(&c.text))).collect())
    }
}

#[async_trait]
impl Judge for ScriptedJudge {
    async fn judge(
        &self,
        _image_url: &str,
        captions: &[CaptionForJudging],
    ) -> Result<Vec<JudgedCaption>, JudgeError> {
        Ok((self.script)(captions))
    }
}

pub fn word_score(text: &str) -> i64 {
    text.split_whitespace().count() as i64
}

pub fn judged(caption: &CaptionForJudging, points: i64) -> JudgedCaption {
    JudgedCaption {
        display_name: caption.display_name.clone(),
        text: caption.text.clone(),
        humour: points,
        relevance: points,
        roast: format!("{} tried", caption.display_name),
    }
}

pub struct FailingJudge;

#[async_trait]
impl Judge for FailingJudge {
    async fn judge(
        &self,
        _image_url: &str,
        _captions: &[CaptionForJudging],
    ) -> Result<Vec<JudgedCaption>, JudgeError> {
        Err(JudgeError::Status {
            status: 503,
            body: "overloaded".to_string(),
        })
    }
}

/// Never answers within any sane timeout.
pub struct SlowJudge {
    pub delay: Duration,
}

#[async_trait]
impl Judge for SlowJudge {
    async fn judge(
        &self,
        _image_url: &str,
        captions: &[CaptionForJudging],
    ) -> Result<Vec<JudgedCaption>, JudgeError> {
        tokio::time::sleep(self.delay).await;
        Ok(captions.iter().map(|c| judged(c, 10)).collect())
    }
}

pub struct BrokenImageSource;

#[async_trait]
impl ImageSource for BrokenImageSource {
    async fn fetch_image_reference(&self) -> Result<String, ImageSourceError> {
        Err(ImageSourceError::Status(500))
    }
}

/// Records every notice in order.
#[derive(Default)]
pub struct RecordingBroadcaster {
    notices: Mutex<Vec<(String, SessionNotice)>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<(String, SessionNotice)> {
        self.notices.lock().clone()
    }

    pub fn names_for(&self, session_code: &str) -> Vec<&'static str> {
        self.notices
            .lock()
            .iter()
            .filter(|(code, _)| code == session_code)
            .map(|(_, notice)| notice.name())
            .collect()
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn notify(&self, session_code: &str, notice: SessionNotice) {
        self.notices
            .lock()
            .push((session_code.to_string(), notice));
    }
}

/// Held by a test while a storage call is parked.
pub struct Parked {
    pub reached: oneshot::Receiver<()>,
    pub release: oneshot::Sender<()>,
}

/// In-memory storage with injectable interleavings and faults.
#[derive(Default)]
pub struct InterposedStorage {
    inner: InMemoryStorage,
    park_active_round: Mutex<Option<(oneshot::Sender<()>, oneshot::Receiver<()>)>>,
    fail_finalize: AtomicBool,
}

impl InterposedStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Park the next `active_round` call after it has read, until released.
    pub fn park_next_active_round(&self) -> Parked {
        let (reached_tx, reached) = oneshot::channel();
        let (release, release_rx) = oneshot::channel();
        *self.park_active_round.lock() = Some((reached_tx, release_rx));
        Parked { reached, release }
    }

    /// Make the next `finalize_reveal` fail as if the database went away.
    pub fn fail_next_finalize(&self) {
        self.fail_finalize.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for InterposedStorage {
    async fn insert_session(
        &self,
        session: NewSession,
        host: NewPlayer,
    ) -> Result<Session, StorageError> {
        self.inner.insert_session(session, host).await
    }

    async fn find_session(&self, code: &str) -> Result<Option<Session>, StorageError> {
        self.inner.find_session(code).await
    }

    async fn update_session_status(
        &self,
        code: &str,
        status: SessionStatus,
    ) -> Result<Option<Session>, StorageError> {
        self.inner.update_session_status(code, status).await
    }

    async fn insert_player(
        &self,
        code: &str,
        player: NewPlayer,
    ) -> Result<Option<Player>, StorageError> {
        self.inner.insert_player(code, player).await
    }

    async fn list_players(&self, code: &str) -> Result<Vec<Player>, StorageError> {
        self.inner.list_players(code).await
    }

    async fn find_player(
        &self,
        code: &str,
        player_id: &str,
    ) -> Result<Option<Player>, StorageError> {
        self.inner.find_player(code, player_id).await
    }

    async fn open_round(
        &self,
        code: &str,
        round: NewRound,
        status: SessionStatus,
    ) -> Result<Option<(Session, Round)>, StorageError> {
        self.inner.open_round(code, round, status).await
    }

    async fn find_round(&self, code: &str, round_id: &str) -> Result<Option<Round>, StorageError> {
        self.inner.find_round(code, round_id).await
    }

    async fn active_round(&self, code: &str) -> Result<Option<Round>, StorageError> {
        let read = self.inner.active_round(code).await;
        let parked = self.park_active_round.lock().take();
        if let Some((reached, release)) = parked {
            let _ = reached.send(());
            let _ = release.await;
        }
        read
    }

    async fn finalize_reveal(
        &self,
        code: &str,
        round_id: &str,
        scores: &[(String, Score)],
        ended_at: OffsetDateTime,
        status: SessionStatus,
    ) -> Result<Option<RevealedRound>, StorageError> {
        if self.fail_finalize.swap(false, Ordering::SeqCst) {
            return Err(StorageError::Unavailable("connection reset".into()));
        }
        self.inner
            .finalize_reveal(code, round_id, scores, ended_at, status)
            .await
    }

    async fn insert_caption(
        &self,
        code: &str,
        round_id: &str,
        caption: NewCaption,
    ) -> Result<Option<Caption>, StorageError> {
        self.inner.insert_caption(code, round_id, caption).await
    }

    async fn list_round_captions(
        &self,
        code: &str,
        round_id: &str,
    ) -> Result<Vec<Caption>, StorageError> {
        self.inner.list_round_captions(code, round_id).await
    }

    async fn list_session_captions(&self, code: &str) -> Result<Vec<Caption>, StorageError> {
        self.inner.list_session_captions(code).await
    }

    async fn count_round_captions(
        &self,
        code: &str,
        round_id: &str,
    ) -> Result<usize, StorageError> {
        self.inner.count_round_captions(code, round_id).await
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> Result<u64, StorageError> {
        self.inner.delete_expired(now).await
    }

    async fn delete_session(&self, code: &str) -> Result<bool, StorageError> {
        self.inner.delete_session(code).await
    }
}
