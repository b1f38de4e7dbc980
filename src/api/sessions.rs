use actix_web::{HttpResponse, delete, post, web};
use log::info;
use std::sync::atomic::Ordering;
use uuid::Uuid;

use super::errors::ApiError;
use super::models::{AppState, NewSessionRequest, NewSessionResponse};
use crate::blockchain::Chain;

/// Start a new diary: mines genesis and returns the session id.
#[post("/sessions/")]
pub async fn create_session(
    state: web::Data<AppState>,
    body: Option<web::Json<NewSessionRequest>>,
) -> Result<HttpResponse, ApiError> {
    let req = body.map(web::Json::into_inner).unwrap_or_default();
    let difficulty = req.difficulty.unwrap_or(state.config.difficulty);
    let mode = req.mode.unwrap_or(state.config.mode);

    let chain = Chain::new(difficulty, mode, state.config.miner())?;
    let genesis = chain.tip().describe();
    let session_id = state.insert(chain);

    info!("SESSION - created {session_id} (difficulty={difficulty}, mode={mode})");
    Ok(HttpResponse::Created().json(NewSessionResponse {
        session_id,
        difficulty,
        mode,
        genesis,
    }))
}

/// Drop a session, aborting any mining still running for it.
#[delete("/sessions/{id}/")]
pub async fn delete_session(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let session = state.remove(id)?;
    session.cancel.store(true, Ordering::Relaxed);
    info!("SESSION - dropped {id}");
    Ok(HttpResponse::NoContent().finish())
}
