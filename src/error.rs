use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;
use uuid::Uuid;

use crate::models::ErrorResponse;
use crate::services::StoreError;

/// Errors surfaced by the matching core
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Profile {0} is not ready for matching")]
    NotReady(Uuid),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("Downstream failure: {0}")]
    Downstream(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl MatchError {
    pub fn validation(message: impl Into<String>) -> Self {
        MatchError::Validation(message.into())
    }

    pub fn not_found(kind: &'static str, id: Uuid) -> Self {
        MatchError::NotFound { kind, id }
    }

    /// Short machine-readable code used in error bodies
    pub fn code(&self) -> &'static str {
        match self {
            MatchError::Validation(_) => "validation_failed",
            MatchError::NotReady(_) => "not_ready",
            MatchError::NotFound { .. } => "not_found",
            MatchError::Downstream(_) => "downstream_unavailable",
            MatchError::Store(_) => "storage_error",
        }
    }
}

impl ResponseError for MatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            MatchError::Validation(_) => StatusCode::BAD_REQUEST,
            MatchError::NotReady(_) => StatusCode::CONFLICT,
            MatchError::NotFound { .. } => StatusCode::NOT_FOUND,
            MatchError::Downstream(_) => StatusCode::SERVICE_UNAVAILABLE,
            MatchError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}
