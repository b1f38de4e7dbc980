use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::blockchain::DiaryError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Diary(#[from] DiaryError),

    #[error("session {0} not found")]
    SessionNotFound(Uuid),

    #[error("background worker failed: {0}")]
    Worker(String),
}

impl From<BlockingError> for ApiError {
    fn from(err: BlockingError) -> Self {
        ApiError::Worker(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorJson {
    message: &'static str,
    detail: String,
}

impl ApiError {
    fn message(&self) -> &'static str {
        match self {
            ApiError::Diary(DiaryError::MiningCancelled) => "mining cancelled",
            ApiError::Diary(DiaryError::StaleCandidate) => "chain changed",
            ApiError::Diary(_) => "invalid request",
            ApiError::SessionNotFound(_) => "unknown session",
            ApiError::Worker(_) => "generic server error",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Diary(DiaryError::MiningCancelled | DiaryError::StaleCandidate) => {
                StatusCode::CONFLICT
            }
            ApiError::Diary(_) => StatusCode::BAD_REQUEST,
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorJson {
            message: self.message(),
            detail: self.to_string(),
        })
    }
}
