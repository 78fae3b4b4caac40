use migration::{migrate, MigrationCommand};
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::error::AppError;

/// Connect to the relational store and bring its schema up to date.
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, AppError> {
    let conn = migration::connect(database_url)
        .await
        .map_err(|e| AppError::DbUnavailable {
            detail: format!("Failed to connect to database: {e}"),
        })?;
    migrate(&conn, MigrationCommand::Up)
        .await
        .map_err(|e| AppError::config(format!("Failed to migrate database: {e}")))?;
    info!("Database connected and migrated");
    Ok(conn)
}
