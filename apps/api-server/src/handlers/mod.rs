//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;
mod upload;

#[cfg(test)]
mod tests;

use actix_web::{HttpResponse, error, web};

use merpati_shared::ErrorResponse;

pub use health::not_found;

fn bad_request(message: &str, err: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse::new(message).with_error(err.to_string()))
}

/// Extractor configs so malformed bodies, query strings and paths answer
/// with the error envelope instead of actix's plain-text defaults.
fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let response = bad_request("invalid request body", &err);
        error::InternalError::from_response(err, response).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let response = bad_request("invalid query parameters", &err);
        error::InternalError::from_response(err, response).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        let response = bad_request("invalid path parameters", &err);
        error::InternalError::from_response(err, response).into()
    }));
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    configure_extractors(cfg);

    cfg.route("/", web::get().to(health::index)).service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .route("/register", web::post().to(auth::register))
            .route("/login", web::post().to(auth::login))
            // Protected routes
            .route("/profile", web::get().to(auth::profile))
            .route("/upload", web::post().to(upload::upload_image))
            .route("/admin/posts", web::get().to(posts::list_for_admin))
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list))
                    .route("", web::post().to(posts::create))
                    // before /{id} so "my" is not taken for an id
                    .route("/my", web::get().to(posts::list_mine))
                    .route("/{id}", web::get().to(posts::get))
                    .route("/{id}", web::put().to(posts::update))
                    .route("/{id}", web::delete().to(posts::delete)),
            ),
    );
}
