//! Authentication extractor.

use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use uuid::Uuid;

use merpati_core::error::DomainError;
use merpati_core::ports::{AuthError, TokenClaims};

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Authenticated caller identity.
///
/// Use this in handlers to require a bearer token:
/// ```ignore
/// async fn protected_route(caller: AuthenticatedCaller) -> impl Responder {
///     format!("Hello, {}!", caller.full_name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedCaller {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
}

impl From<TokenClaims> for AuthenticatedCaller {
    fn from(claims: TokenClaims) -> Self {
        Self {
            id: claims.user_id,
            email: claims.email,
            full_name: claims.full_name,
        }
    }
}

fn unauthorized(err: AuthError) -> AppError {
    AppError::from(DomainError::from(err))
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedCaller, AppError> {
    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        tracing::error!("AppState not found in app data");
        AppError::from(DomainError::Internal("server configuration error".to_string()))
    })?;

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| unauthorized(AuthError::MissingAuth))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| unauthorized(AuthError::InvalidFormat))?;

    // Exactly "Bearer <token>"
    let token = match auth_str.split(' ').collect::<Vec<_>>().as_slice() {
        ["Bearer", token] if !token.is_empty() => *token,
        _ => return Err(unauthorized(AuthError::InvalidFormat)),
    };

    let claims = state.tokens.validate_token(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        unauthorized(e)
    })?;

    Ok(claims.into())
}

impl FromRequest for AuthenticatedCaller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
