use actix_web::{HttpResponse, get, post, web};
use log::{debug, warn};
use uuid::Uuid;

use super::errors::ApiError;
use super::models::{
    AppState, ChainResponse, DifficultyResponse, SetDifficultyRequest, ValidateResponse,
};

/// Timeline of a session, newest block first.
#[get("/sessions/{id}/chain/")]
pub async fn get_chain(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let session = state.session(path.into_inner())?;
    let chain = session.lock();
    let resp = ChainResponse {
        length: chain.len(),
        difficulty: chain.difficulty(),
        mode: chain.mode(),
        blocks: chain.blocks().iter().rev().map(|b| b.describe()).collect(),
        pending: chain.pending().to_vec(),
    };
    Ok(HttpResponse::Ok().json(resp))
}

/// Validate the whole chain.
#[get("/sessions/{id}/validate/")]
pub async fn validate_chain(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let session = state.session(id)?;
    let chain = session.lock();
    let outcome = chain.validate();
    if let Err(e) = &outcome {
        warn!("VALIDATE - session {id}: {e}");
    }
    let resp = ValidateResponse {
        valid: outcome.is_ok(),
        length: chain.len(),
        difficulty: chain.difficulty(),
        failed_index: outcome.as_ref().err().and_then(|e| e.index()),
        reason: outcome.err().map(|e| e.to_string()),
    };
    Ok(HttpResponse::Ok().json(resp))
}

/// Get current PoW difficulty.
#[get("/sessions/{id}/difficulty/")]
pub async fn get_difficulty(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let session = state.session(path.into_inner())?;
    let chain = session.lock();
    Ok(HttpResponse::Ok().json(DifficultyResponse {
        difficulty: chain.difficulty(),
    }))
}

/// Update PoW difficulty (affects future blocks and validation).
#[post("/sessions/{id}/difficulty/")]
pub async fn set_difficulty(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<SetDifficultyRequest>,
) -> Result<HttpResponse, ApiError> {
    let session = state.session(path.into_inner())?;
    let mut chain = session.lock();
    chain.set_difficulty(body.difficulty)?;
    debug!("DIFFICULTY - now {}", chain.difficulty());
    Ok(HttpResponse::Ok().json(DifficultyResponse {
        difficulty: chain.difficulty(),
    }))
}
