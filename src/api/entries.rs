use actix_web::{HttpResponse, post, web};
use log::info;
use std::time::Instant;
use uuid::Uuid;

use super::errors::ApiError;
use super::models::{AppState, EntryRequest, EntryResponse};
use crate::blockchain::{Chain, DiaryError, EntryMode};

/// Submit a diary entry. Instant sessions mine it right away on the blocking
/// pool, without holding the chain lock; batched sessions queue it until `/mine/`.
#[post("/sessions/{id}/entries/")]
pub async fn post_entry(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<EntryRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let session = state.session(id)?;
    let EntryRequest { author, text } = body.into_inner();
    let t0 = Instant::now();

    let resp = web::block(move || -> Result<EntryResponse, DiaryError> {
        let mode = session.lock().mode();
        match mode {
            EntryMode::Instant => session
                .mine_detached(|chain| chain.begin_append(&author, &text))
                .map(|block| EntryResponse::Sealed { block }),
            EntryMode::Batched => session
                .lock()
                .stage_entry(&author, &text)
                .map(|pending| EntryResponse::Staged { pending }),
        }
    })
    .await??;

    if let EntryResponse::Sealed { block } = &resp {
        info!(
            "ENTRY - session {id} sealed block #{} ({} ms)",
            block.index,
            t0.elapsed().as_millis()
        );
    }
    Ok(HttpResponse::Ok().json(resp))
}

/// Seal every pending entry of a batched session into one block.
#[post("/sessions/{id}/mine/")]
pub async fn mine_pending(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let session = state.session(id)?;
    let t0 = Instant::now();

    let block = web::block(move || session.mine_detached(Chain::begin_seal)).await??;

    info!(
        "MINER - session {id} sealed block #{} with {} entries ({} ms)",
        block.index,
        block.payload.len(),
        t0.elapsed().as_millis()
    );
    Ok(HttpResponse::Ok().json(EntryResponse::Sealed { block }))
}
