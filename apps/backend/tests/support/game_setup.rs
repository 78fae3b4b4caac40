//! Builders for service-level tests.

use std::sync::Arc;

use cagematch::config::GameRules;
use cagematch::images::StaticImageSource;
use cagematch::judge::Judge;
use cagematch::services::PlayerCredentials;
use cagematch::storage::Storage;
use cagematch::{AppState, DomainError, StateBuilder};

use super::doubles::{RecordingBroadcaster, ScriptedJudge};

pub const TEST_IMAGE: &str = "https://cdn.test/cat-1.jpg";

pub struct TestGame {
    pub state: AppState,
    pub notices: Arc<RecordingBroadcaster>,
}

pub struct TestGameBuilder {
    rules: GameRules,
    judge: Arc<dyn Judge>,
    storage: Option<Arc<dyn Storage>>,
}

impl TestGameBuilder {
    pub fn new() -> Self {
        Self {
            rules: GameRules::default(),
            judge: ScriptedJudge::word_counter(),
            storage: None,
        }
    }

    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn rules(mut self, f: impl FnOnce(&mut GameRules)) -> Self {
        f(&mut self.rules);
        self
    }

    pub fn judge(mut self, judge: Arc<dyn Judge>) -> Self {
        self.judge = judge;
        self
    }

    pub fn build(self) -> TestGame {
        let notices = RecordingBroadcaster::new();
        let mut builder = StateBuilder::new();
        if let Some(storage) = self.storage {
            builder = builder.with_storage(storage);
        }
        let state = builder
            .with_rules(self.rules)
            .with_judge(self.judge)
            .with_images(Arc::new(StaticImageSource::new(vec![TEST_IMAGE.to_string()])))
            .with_broadcaster(notices.clone())
            .build();
        TestGame { state, notices }
    }
}

impl Default for TestGameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A session with the host plus `guests` joined players, still in the lobby.
pub async fn lobby(
    game: &TestGame,
    rounds_total: u8,
    guests: &[&str],
) -> Result<(PlayerCredentials, Vec<PlayerCredentials>), DomainError> {
    let host = game
        .state
        .registry
        .create_session("Host", Some(rounds_total))
        .await?;
    let mut joined = Vec::with_capacity(guests.len());
    for name in guests {
        joined.push(
            game.state
                .registry
                .join_session(&host.session.code, name)
                .await?,
        );
    }
    Ok((host, joined))
}
