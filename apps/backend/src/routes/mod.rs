use actix_web::web;

pub mod health;
pub mod realtime;
pub mod sessions;

pub const JOIN_SCOPE: &str = "/api/sessions/{code}/players";
pub const CAPTIONS_SCOPE: &str = "/api/sessions/{code}/rounds/{round_id}/captions";

/// Configure application routes for tests and non-HttpServer contexts.
///
/// In production, `main.rs` mounts the join and caption scopes behind
/// rate limiters. Tests register the same paths without them.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/health").configure(health::configure_routes));

    // The narrower scopes must come before `/api/sessions`.
    cfg.service(web::scope(JOIN_SCOPE).configure(sessions::configure_join));
    cfg.service(web::scope(CAPTIONS_SCOPE).configure(sessions::configure_captions));
    cfg.service(web::scope("/api/sessions").configure(sessions::configure_routes));

    cfg.service(web::scope("/api/ws").configure(realtime::configure_routes));
}
