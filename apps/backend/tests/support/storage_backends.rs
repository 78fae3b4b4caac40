//! Both storage backends, freshly created per test.

use std::sync::Arc;

use cagematch::storage::{InMemoryStorage, SeaStorage, Storage};
use migration::{migrate, MigrationCommand};

pub fn memory() -> Arc<dyn Storage> {
    Arc::new(InMemoryStorage::new())
}

pub async fn sqlite() -> Arc<dyn Storage> {
    let db = migration::connect("sqlite::memory:")
        .await
        .expect("connect sqlite");
    migrate(&db, MigrationCommand::Up)
        .await
        .expect("migrate sqlite");
    Arc::new(SeaStorage::new(db))
}
