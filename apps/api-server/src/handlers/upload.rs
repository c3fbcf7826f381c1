//! Image upload handler.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures::StreamExt;

use merpati_core::error::DomainError;
use merpati_core::ports::UploadRequest;
use merpati_shared::ApiResponse;
use merpati_shared::dto::UploadResponse;

use crate::middleware::auth::AuthenticatedCaller;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Largest accepted image.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const IMAGE_FIELD: &str = "image";

fn multipart_err(e: actix_multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("invalid multipart body: {}", e))
}

/// Pull the `image` field out of the form, enforcing type and size.
async fn read_image(mut payload: Multipart) -> AppResult<UploadRequest> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(multipart_err)?;
        if field.name() != Some(IMAGE_FIELD) {
            while let Some(chunk) = field.next().await {
                chunk.map_err(multipart_err)?;
            }
            continue;
        }

        let content_type = field.content_type().map(|m| m.essence_str().to_string());
        if !content_type.as_deref().is_some_and(|ct| ct.starts_with("image/")) {
            return Err(DomainError::validation("file must be an image").into());
        }

        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or("upload")
            .to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(multipart_err)?;
            if bytes.len() + chunk.len() > MAX_IMAGE_BYTES {
                return Err(DomainError::validation("image must not exceed 10 MiB").into());
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(DomainError::validation("image file is empty").into());
        }

        return Ok(UploadRequest {
            file_name,
            content_type,
            bytes,
        });
    }

    Err(DomainError::validation("image file is required").into())
}

/// POST /api/upload
pub async fn upload_image(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let request = read_image(payload).await?;

    let storage = state.media.as_ref().ok_or_else(|| {
        AppError::from(DomainError::Internal(
            "media storage is not configured".to_string(),
        ))
    })?;

    let size = request.bytes.len();
    let url = storage.upload(request).await?;

    tracing::info!(user_id = %caller.id, size, "Image uploaded");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "image uploaded successfully",
        UploadResponse { url },
    )))
}
