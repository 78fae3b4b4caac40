//! Session and round HTTP routes under `/api/sessions`.

use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;

use crate::error::AppError;
use crate::extractors::AuthToken;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub display_name: String,
    #[serde(default)]
    pub rounds_total: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct JoinSessionRequest {
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitCaptionRequest {
    pub text: String,
}

/// POST /api/sessions
///
/// Creates a session with the caller as host. The response carries the
/// host's player token.
async fn create_session(
    body: web::Json<CreateSessionRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let created = app_state
        .registry
        .create_session(&body.display_name, body.rounds_total)
        .await?;
    Ok(HttpResponse::Created().json(created))
}

/// GET /api/sessions/{code}
async fn get_session(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let state = app_state.registry.get_state(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(state))
}

/// POST /api/sessions/{code}/players
async fn join_session(
    path: web::Path<String>,
    body: web::Json<JoinSessionRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let joined = app_state
        .registry
        .join_session(&path.into_inner(), &body.display_name)
        .await?;
    Ok(HttpResponse::Created().json(joined))
}

/// POST /api/sessions/{code}/rounds
async fn start_round(
    path: web::Path<String>,
    token: AuthToken,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let round = app_state
        .rounds
        .start_round(&path.into_inner(), token.as_str())
        .await?;
    Ok(HttpResponse::Created().json(round))
}

/// POST /api/sessions/{code}/rounds/{round_id}/captions
async fn submit_caption(
    path: web::Path<(String, String)>,
    token: AuthToken,
    body: web::Json<SubmitCaptionRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (code, round_id) = path.into_inner();
    let submitted = app_state
        .rounds
        .submit_caption(&code, &round_id, token.as_str(), &body.text)
        .await?;
    Ok(HttpResponse::Created().json(submitted))
}

/// POST /api/sessions/{code}/rounds/{round_id}/reveal
async fn reveal_round(
    path: web::Path<(String, String)>,
    token: AuthToken,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (code, round_id) = path.into_inner();
    let outcome = app_state
        .rounds
        .reveal_round(&code, &round_id, token.as_str())
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /api/sessions/{code}/end
async fn end_session(
    path: web::Path<String>,
    token: AuthToken,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let session = app_state
        .registry
        .end_session(&path.into_inner(), token.as_str())
        .await?;
    Ok(HttpResponse::Ok().json(session))
}

/// Everything under `/api/sessions` except the rate-limited endpoints.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::post().to(create_session)));
    cfg.service(web::resource("/{code}").route(web::get().to(get_session)));
    cfg.service(web::resource("/{code}/end").route(web::post().to(end_session)));
    cfg.service(web::resource("/{code}/rounds").route(web::post().to(start_round)));
    cfg.service(
        web::resource("/{code}/rounds/{round_id}/reveal").route(web::post().to(reveal_round)),
    );
}

/// Mounted at `/api/sessions/{code}/players`.
pub fn configure_join(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::post().to(join_session)));
}

/// Mounted at `/api/sessions/{code}/rounds/{round_id}/captions`.
pub fn configure_captions(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::post().to(submit_caption)));
}
