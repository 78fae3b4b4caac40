use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, JudgeProvider, StorageKind};
use crate::error::AppError;
use crate::images::CatApiImageSource;
use crate::infra::db::connect_and_migrate;
use crate::judge::{ChatJudge, FakeJudge, Judge};
use crate::state::{AppState, StateBuilder};

const IMAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}

/// Assemble the production state described by `config`.
pub async fn build_state_from_config(config: &AppConfig) -> Result<AppState, AppError> {
    let builder = match config.storage {
        StorageKind::Memory => build_state(),
        StorageKind::Sql => {
            build_state().with_database(connect_and_migrate(&config.database_url).await?)
        }
    };

    let judge: Arc<dyn Judge> = match config.judge_provider {
        JudgeProvider::Fake => Arc::new(FakeJudge),
        JudgeProvider::OpenAi => Arc::new(
            ChatJudge::new(
                config.judge_api_url.clone(),
                config.judge_api_key.clone().unwrap_or_default(),
                config.judge_model.clone(),
                config.rules.judge_timeout,
            )
            .map_err(|e| AppError::config(e.to_string()))?,
        ),
    };

    let images = CatApiImageSource::new(
        config.image_api_url.clone(),
        config.image_api_key.clone(),
        IMAGE_FETCH_TIMEOUT,
    )
    .map_err(|e| AppError::config(e.to_string()))?;

    Ok(builder
        .with_judge(judge)
        .with_images(Arc::new(images))
        .with_secret(config.secret.as_bytes())
        .with_rules(config.rules.clone())
        .build())
}
