use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::AppEnv;

const DEFAULT_FILTER: &str = "info,actix_web=info,sqlx=warn,sea_orm=warn";

/// Install the global subscriber: JSON lines in prod, human-readable in dev.
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing(env: AppEnv) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    match env {
        AppEnv::Prod => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(false)
                    .json(),
            )
            .init(),
        AppEnv::Dev => registry.with(fmt::layer().with_target(true)).init(),
    }
}
