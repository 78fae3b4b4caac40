use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::auth::{Authenticator, TokenAuth};
use crate::config::GameRules;
use crate::images::{ImageSource, StaticImageSource, PLACEHOLDER_IMAGE_URL};
use crate::judge::{FakeJudge, Judge};
use crate::realtime::{Broadcaster, SessionHub};
use crate::services::{ExpiryReaper, RoundCoordinator, SessionLocks, SessionRegistry};
use crate::storage::{InMemoryStorage, SeaStorage, Storage};

/// Shared resources handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub rounds: RoundCoordinator,
    pub hub: Arc<SessionHub>,
    pub auth: Arc<dyn Authenticator>,
    pub storage: Arc<dyn Storage>,
    pub locks: Arc<SessionLocks>,
    /// Present when sessions live in the relational store.
    pub db: Option<DatabaseConnection>,
}

impl AppState {
    pub fn reaper(&self, interval: std::time::Duration) -> ExpiryReaper {
        ExpiryReaper::new(self.storage.clone(), self.locks.clone(), interval)
    }
}

/// Builder for `AppState`, used by both tests and main. Anything not
/// supplied gets an offline default.
pub struct StateBuilder {
    storage: Option<Arc<dyn Storage>>,
    db: Option<DatabaseConnection>,
    judge: Option<Arc<dyn Judge>>,
    images: Option<Arc<dyn ImageSource>>,
    broadcaster: Option<Arc<dyn Broadcaster>>,
    secret: Vec<u8>,
    rules: GameRules,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            storage: None,
            db: None,
            judge: None,
            images: None,
            broadcaster: None,
            secret: b"cagematch-test-secret".to_vec(),
            rules: GameRules::default(),
        }
    }

    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Keep sessions in the relational store behind `db`.
    pub fn with_database(mut self, db: DatabaseConnection) -> Self {
        self.storage = Some(Arc::new(SeaStorage::new(db.clone())));
        self.db = Some(db);
        self
    }

    pub fn with_judge(mut self, judge: Arc<dyn Judge>) -> Self {
        self.judge = Some(judge);
        self
    }

    pub fn with_images(mut self, images: Arc<dyn ImageSource>) -> Self {
        self.images = Some(images);
        self
    }

    /// Replace the websocket hub as the notice sink (the hub still serves
    /// websocket subscriptions but receives nothing).
    pub fn with_broadcaster(mut self, broadcaster: Arc<dyn Broadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    pub fn with_secret(mut self, secret: impl AsRef<[u8]>) -> Self {
        self.secret = secret.as_ref().to_vec();
        self
    }

    pub fn with_rules(mut self, rules: GameRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn build(self) -> AppState {
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(InMemoryStorage::new()) as Arc<dyn Storage>);
        let judge = self
            .judge
            .unwrap_or_else(|| Arc::new(FakeJudge) as Arc<dyn Judge>);
        let images = self.images.unwrap_or_else(|| {
            Arc::new(StaticImageSource::new(vec![PLACEHOLDER_IMAGE_URL.to_string()]))
                as Arc<dyn ImageSource>
        });
        let hub = Arc::new(SessionHub::new());
        let broadcaster = self
            .broadcaster
            .unwrap_or_else(|| hub.clone() as Arc<dyn Broadcaster>);
        let auth: Arc<dyn Authenticator> = Arc::new(TokenAuth::new(&self.secret));
        let locks = Arc::new(SessionLocks::new());

        let registry = Arc::new(SessionRegistry::new(
            storage.clone(),
            auth.clone(),
            broadcaster,
            locks.clone(),
            self.rules,
        ));
        let rounds = RoundCoordinator::new(registry.clone(), images, judge);

        AppState {
            registry,
            rounds,
            hub,
            auth,
            storage,
            locks,
            db: self.db,
        }
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
