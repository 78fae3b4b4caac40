//! Process configuration read from environment variables.

use std::str::FromStr;
use std::time::Duration;

use crate::domain::model::{SessionSettings, MAX_ROUNDS, MIN_ROUNDS};
use crate::error::AppError;
use crate::images::DEFAULT_CAT_API_URL;

const DEV_SECRET: &str = "cagematch-dev-secret-change-me";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    Sql,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeProvider {
    Fake,
    OpenAi,
}

/// Who may trigger a reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealPolicy {
    /// Only an explicit host reveal.
    #[default]
    HostOnly,
    /// Also reveal as soon as every player has submitted.
    AutoWhenAllSubmitted,
}

/// Game rules handed to the session services.
#[derive(Debug, Clone)]
pub struct GameRules {
    pub default_settings: SessionSettings,
    pub max_caption_words: usize,
    pub session_ttl: Duration,
    pub judge_timeout: Duration,
    pub reveal_policy: RevealPolicy,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            default_settings: SessionSettings::default(),
            max_caption_words: 15,
            session_ttl: Duration::from_secs(2 * 60 * 60),
            judge_timeout: Duration::from_secs(10),
            reveal_policy: RevealPolicy::HostOnly,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub env: AppEnv,
    pub secret: String,
    pub storage: StorageKind,
    pub database_url: String,
    pub judge_provider: JudgeProvider,
    pub judge_api_url: String,
    pub judge_api_key: Option<String>,
    pub judge_model: String,
    pub image_api_url: String,
    pub image_api_key: Option<String>,
    pub rules: GameRules,
    pub reaper_interval: Duration,
    pub cors_allowed_origins: Vec<String>,
    pub joins_per_minute: u64,
    pub captions_per_minute: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name -> value lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let env = match var("APP_ENV").as_deref() {
            None | Some("dev") => AppEnv::Dev,
            Some("prod") => AppEnv::Prod,
            Some(other) => {
                return Err(AppError::config(format!(
                    "APP_ENV must be dev or prod, got '{other}'"
                )))
            }
        };

        let secret = match (var("APP_SECRET"), env) {
            (Some(secret), _) => secret,
            (None, AppEnv::Dev) => DEV_SECRET.to_string(),
            (None, AppEnv::Prod) => return Err(AppError::config("APP_SECRET must be set in prod")),
        };

        let storage = match var("STORAGE_TYPE").as_deref() {
            None | Some("memory") => StorageKind::Memory,
            Some("sql") => StorageKind::Sql,
            Some(other) => {
                return Err(AppError::config(format!(
                    "STORAGE_TYPE must be memory or sql, got '{other}'"
                )))
            }
        };

        let judge_provider = match var("JUDGE_PROVIDER").as_deref() {
            None | Some("fake") => JudgeProvider::Fake,
            Some("openai") => JudgeProvider::OpenAi,
            Some(other) => {
                return Err(AppError::config(format!(
                    "JUDGE_PROVIDER must be fake or openai, got '{other}'"
                )))
            }
        };
        let judge_api_key = var("JUDGE_API_KEY");
        if judge_provider == JudgeProvider::OpenAi && judge_api_key.is_none() {
            return Err(AppError::config("JUDGE_API_KEY must be set for the openai judge"));
        }

        let rounds: u8 = parse(&var, "DEFAULT_ROUNDS", 3)?;
        let default_settings = SessionSettings::new(rounds).map_err(|_| {
            AppError::config(format!(
                "DEFAULT_ROUNDS must be between {MIN_ROUNDS} and {MAX_ROUNDS}"
            ))
        })?;

        let max_caption_words: usize = parse(&var, "MAX_CAPTION_WORDS", 15)?;
        if max_caption_words == 0 {
            return Err(AppError::config("MAX_CAPTION_WORDS must be positive"));
        }

        let reveal_policy = if parse(&var, "AUTO_REVEAL", false)? {
            RevealPolicy::AutoWhenAllSubmitted
        } else {
            RevealPolicy::HostOnly
        };

        let rules = GameRules {
            default_settings,
            max_caption_words,
            session_ttl: Duration::from_secs(
                parse::<u64, _>(&var, "SESSION_EXPIRY_HOURS", 2)? * 3600,
            ),
            judge_timeout: Duration::from_secs(parse(&var, "JUDGE_TIMEOUT_SECS", 10)?),
            reveal_policy,
        };

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "null")
            .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
            .map(str::to_string)
            .collect();

        Ok(Self {
            host: var("BACKEND_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse(&var, "BACKEND_PORT", 3001)?,
            env,
            secret,
            storage,
            database_url: var("DATABASE_URL").unwrap_or_else(|| "sqlite::memory:".to_string()),
            judge_provider,
            judge_api_url: var("JUDGE_API_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            judge_api_key,
            judge_model: var("JUDGE_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            image_api_url: var("IMAGE_API_URL").unwrap_or_else(|| DEFAULT_CAT_API_URL.to_string()),
            image_api_key: var("THECATAPI_KEY"),
            rules,
            reaper_interval: Duration::from_secs(
                parse::<u64, _>(&var, "REAPER_INTERVAL_SECS", 3600)?.max(1),
            ),
            cors_allowed_origins,
            joins_per_minute: parse(&var, "RATE_LIMIT_JOINS_PER_MINUTE", 10)?,
            captions_per_minute: parse(&var, "RATE_LIMIT_CAPTIONS_PER_MINUTE", 5)?,
        })
    }
}

fn parse<T, V>(var: &V, name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    V: Fn(&str) -> Option<String>,
{
    match var(name) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::config(format!("{name} has an invalid value: '{raw}'"))),
    }
}
