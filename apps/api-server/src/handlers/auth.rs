//! Registration, login and profile handlers.

use actix_web::{HttpResponse, web};

use merpati_shared::ApiResponse;
use merpati_shared::dto::{
    LoginRequest, LoginResponse, ProfileResponse, RegisterRequest, UserResponse,
};

use crate::middleware::auth::AuthenticatedCaller;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .credentials
        .register(&req.full_name, &req.email, &req.password)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(
        "user registered successfully",
        UserResponse {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            created_at: user.created_at,
        },
    )))
}

/// POST /api/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let session = state.credentials.login(&req.email, &req.password).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "login successful",
        LoginResponse {
            token: session.token,
            token_type: "Bearer".to_string(),
            expires_in: session.expires_in,
        },
    )))
}

/// GET /api/profile - Protected route
pub async fn profile(caller: AuthenticatedCaller) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "profile retrieved successfully",
        ProfileResponse {
            id: caller.id,
            email: caller.email,
            full_name: caller.full_name,
        },
    )))
}
