use actix_extensible_rate_limit::backend::memory::InMemoryBackend;
use actix_extensible_rate_limit::RateLimiter;
use actix_web::{web, App, HttpServer};
use cagematch::config::AppConfig;
use cagematch::infra::state::build_state_from_config;
use cagematch::middleware::cors::cors_middleware;
use cagematch::middleware::rate_limit::{caption_rate_limit_config, join_rate_limit_config};
use cagematch::middleware::request_trace::RequestTrace;
use cagematch::routes::{self, sessions, CAPTIONS_SCOPE, JOIN_SCOPE};
use cagematch::telemetry;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Environment variables must be set by the runtime environment.
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    telemetry::init_tracing(config.env);

    let app_state = match build_state_from_config(&config).await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("❌ Failed to build application state: {e}");
            std::process::exit(1);
        }
    };

    let shutdown = CancellationToken::new();
    let reaper = app_state
        .reaper(config.reaper_interval)
        .spawn(shutdown.clone());

    info!(
        host = %config.host,
        port = config.port,
        storage = ?config.storage,
        judge = ?config.judge_provider,
        "Starting Caption Cage Match backend"
    );

    let data = web::Data::new(app_state);
    let rate_backend = InMemoryBackend::builder().build();
    let origins = config.cors_allowed_origins.clone();
    let joins_per_minute = config.joins_per_minute;
    let captions_per_minute = config.captions_per_minute;

    let result = HttpServer::new(move || {
        let join_limiter = RateLimiter::builder(
            rate_backend.clone(),
            join_rate_limit_config(joins_per_minute).build(),
        )
        .add_headers()
        .build();
        let caption_limiter = RateLimiter::builder(
            rate_backend.clone(),
            caption_rate_limit_config(captions_per_minute).build(),
        )
        .add_headers()
        .build();

        App::new()
            .wrap(cors_middleware(&origins))
            .wrap(RequestTrace)
            .app_data(data.clone())
            .service(web::scope("/health").configure(routes::health::configure_routes))
            .service(
                web::scope(JOIN_SCOPE)
                    .wrap(join_limiter)
                    .configure(sessions::configure_join),
            )
            .service(
                web::scope(CAPTIONS_SCOPE)
                    .wrap(caption_limiter)
                    .configure(sessions::configure_captions),
            )
            .service(web::scope("/api/sessions").configure(sessions::configure_routes))
            .service(web::scope("/api/ws").configure(routes::realtime::configure_routes))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await;

    shutdown.cancel();
    if let Err(e) = reaper.await {
        eprintln!("❌ Expiry reaper exited abnormally: {e}");
    }
    result
}
