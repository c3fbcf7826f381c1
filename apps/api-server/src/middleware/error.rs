//! Error handling - maps domain errors to the response envelope once.

use std::fmt;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};

use merpati_core::error::DomainError;
use merpati_core::ports::MediaError;
use merpati_shared::ErrorResponse;

/// Application-level error type that converts to error envelopes.
#[derive(Debug)]
pub enum AppError {
    Domain(DomainError),
    /// Malformed request the domain never saw: bad JSON, bad path id.
    BadRequest(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Domain(err) => write!(f, "{}", err),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Domain(err) => match err {
                DomainError::Validation(_) => StatusCode::BAD_REQUEST,
                DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
                DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
                DomainError::Conflict(_) => StatusCode::CONFLICT,
                DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::BadRequest(msg) => ErrorResponse::new(msg.clone()),
            AppError::Domain(DomainError::NotFound { entity_type, .. }) => {
                ErrorResponse::new(format!("{} not found", entity_type))
            }
            AppError::Domain(DomainError::Internal(detail)) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
            AppError::Domain(err) => ErrorResponse::new(err.to_string()),
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::Domain(err)
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        AppError::Domain(DomainError::Internal(format!("image upload failed: {}", err)))
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
