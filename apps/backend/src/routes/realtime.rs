//! Websocket subscription to a session's notices.

use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;
use tracing::debug;

use crate::domain::session_code::normalize_session_code;
use crate::error::AppError;
use crate::realtime::WsSession;
use crate::state::app_state::AppState;

/// Browsers cannot set headers on a websocket handshake, so the player
/// token travels as a query parameter.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// GET /api/ws/sessions/{code}?token=...
async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<String>,
    query: web::Query<WsQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let code = normalize_session_code(&path.into_inner()).map_err(AppError::from)?;
    // Unknown or expired sessions are 404 before the token is looked at.
    app_state
        .registry
        .get_state(&code)
        .await
        .map_err(AppError::from)?;
    let player_id = app_state
        .auth
        .verify(&query.token, &code)
        .ok_or_else(AppError::unauthorized)?;

    debug!(session_code = %code, player_id = %player_id, "Websocket upgrade");
    ws::start(
        WsSession::new(code, player_id, app_state.hub.clone()),
        &req,
        stream,
    )
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/sessions/{code}").route(web::get().to(upgrade)));
}
