pub mod app;

pub use app::{AppConfig, AppEnv, GameRules, JudgeProvider, RevealPolicy, StorageKind};
