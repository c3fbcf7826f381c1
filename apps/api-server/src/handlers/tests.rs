use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use async_trait::async_trait;
use serde_json::{Value, json};
use uuid::Uuid;

use merpati_core::ports::{MediaError, MediaStorage, TokenService, UploadRequest};
use merpati_infra::auth::{JwtConfig, JwtTokenService};

use super::{configure_routes, not_found};
use crate::state::AppState;

fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "handler-test-secret".to_string(),
        expiration_hours: 1,
        issuer: "merpati-test".to_string(),
    }
}

macro_rules! app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(
                    AppState::in_memory(jwt_config()).expect("state"),
                ))
                .configure(configure_routes)
                .default_service(web::to(not_found)),
        )
        .await
    };
}

/// Register `$email` and return a bearer header value for it.
macro_rules! bearer {
    ($app:expr, $email:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/register")
            .set_json(json!({"full_name": "Test Writer", "email": $email, "password": "password123"}))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({"email": $email, "password": "password123"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        format!("Bearer {}", body["data"]["token"].as_str().expect("token"))
    }};
}

fn post_body(title: &str, content_len: usize) -> Value {
    json!({
        "title": format!("{title} with a long enough title"),
        "content": "c".repeat(content_len),
        "category": "engineering",
        "status": "publish",
        "tags": ["go", "backend"],
    })
}

#[actix_rt::test]
async fn test_root_banner_and_unknown_path() {
    let app = app!();

    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(body["message"], "Welcome to KataMerpati API!");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/nope").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "API endpoint not found");
}

#[actix_rt::test]
async fn test_health_is_ready_in_memory() {
    let app = app!();

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["ready"], true);
}

#[actix_rt::test]
async fn test_register_validation_and_conflict() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(json!({"full_name": "Al", "email": "al@example.com", "password": "password123"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let _ = bearer!(app, "taken@example.com");
    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(json!({"full_name": "Someone", "email": "taken@example.com", "password": "password123"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "email already exists");
}

#[actix_rt::test]
async fn test_login_failures_are_indistinguishable() {
    let app = app!();
    let _ = bearer!(app, "known@example.com");

    let wrong_password = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({"email": "known@example.com", "password": "not-the-password"}))
        .to_request();
    let unknown_email = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({"email": "ghost@example.com", "password": "password123"}))
        .to_request();

    let a = test::call_service(&app, wrong_password).await;
    let b = test::call_service(&app, unknown_email).await;
    assert_eq!(a.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(a.status(), b.status());

    let a: Value = test::read_body_json(a).await;
    let b: Value = test::read_body_json(b).await;
    assert_eq!(a, b);
    assert_eq!(a["message"], "invalid credentials");
}

#[actix_rt::test]
async fn test_auth_gate_messages() {
    let app = app!();

    let expired = JwtTokenService::new(JwtConfig {
        expiration_hours: -2,
        ..jwt_config()
    })
    .generate_token(Uuid::new_v4(), "old@example.com", "Old Token")
    .unwrap();

    let cases = [
        (None, "missing authorization header"),
        (Some("Token abc".to_string()), "invalid format"),
        (Some("Bearer".to_string()), "invalid format"),
        (Some("Bearer a b".to_string()), "invalid format"),
        (Some("Bearer garbage".to_string()), "invalid or expired token"),
        (Some(format!("Bearer {expired}")), "invalid or expired token"),
    ];

    for (auth, expected) in cases {
        let mut req = test::TestRequest::get().uri("/api/profile");
        if let Some(value) = auth {
            req = req.insert_header((header::AUTHORIZATION, value));
        }
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], expected);
    }
}

#[actix_rt::test]
async fn test_profile_returns_token_identity() {
    let app = app!();
    let token = bearer!(app, "me@example.com");

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header((header::AUTHORIZATION, token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["data"]["email"], "me@example.com");
    assert_eq!(body["data"]["full_name"], "Test Writer");
}

#[actix_rt::test]
async fn test_content_length_boundary() {
    let app = app!();
    let token = bearer!(app, "writer@example.com");

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header((header::AUTHORIZATION, token.clone()))
        .set_json(post_body("Too short", 199))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header((header::AUTHORIZATION, token))
        .set_json(post_body("Just right", 200))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["tags"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["author"]["email"], "writer@example.com");
}

#[actix_rt::test]
async fn test_non_author_update_is_forbidden() {
    let app = app!();
    let author = bearer!(app, "author@example.com");
    let intruder = bearer!(app, "intruder@example.com");

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header((header::AUTHORIZATION, author))
        .set_json(post_body("Original", 200))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/posts/{id}"))
        .insert_header((header::AUTHORIZATION, intruder.clone()))
        .set_json(post_body("Hijacked", 200))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{id}"))
        .insert_header((header::AUTHORIZATION, intruder))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{id}"))
        .to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched["data"]["title"], created["data"]["title"]);
    assert_eq!(fetched["data"]["tags"], created["data"]["tags"]);
}

#[actix_rt::test]
async fn test_pagination_meta_total() {
    let app = app!();
    let token = bearer!(app, "prolific@example.com");

    for i in 0..25 {
        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header((header::AUTHORIZATION, token.clone()))
            .set_json(post_body(&format!("Post {i}"), 200))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri("/api/posts?limit=10&offset=20")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    assert_eq!(body["meta"]["total"], 25);
    assert_eq!(body["meta"]["limit"], 10);
    assert_eq!(body["meta"]["offset"], 20);

    let req = test::TestRequest::get()
        .uri("/api/posts/my")
        .insert_header((header::AUTHORIZATION, token))
        .to_request();
    let mine: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(mine["meta"]["total"], 25);
    assert_eq!(mine["data"].as_array().unwrap().len(), 10);
}

#[actix_rt::test]
async fn test_malformed_requests_get_error_envelope() {
    let app = app!();
    let token = bearer!(app, "sloppy@example.com");

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/posts/not-a-uuid").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "invalid post id");

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/posts?status=archived").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/posts?limit=ten").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header((header::AUTHORIZATION, token))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "invalid request body");
}

#[actix_rt::test]
async fn test_upload_requires_image_field() {
    let app = app!();
    let token = bearer!(app, "uploader@example.com");
    let boundary = "merpati-boundary";

    let multipart = |name: &str, content_type: &str| {
        format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"{name}\"; filename=\"a.bin\"\r\n\
             Content-Type: {content_type}\r\n\r\n\
             data\r\n\
             --{boundary}--\r\n"
        )
    };

    let cases = [
        (multipart("attachment", "image/png"), "image file is required"),
        (multipart("image", "text/plain"), "file must be an image"),
    ];

    for (payload, expected) in cases {
        let req = test::TestRequest::post()
            .uri("/api/upload")
            .insert_header((header::AUTHORIZATION, token.clone()))
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            ))
            .set_payload(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], expected);
    }
}

#[actix_rt::test]
async fn test_upload_without_storage_is_internal_error() {
    let app = app!();
    let token = bearer!(app, "nostorage@example.com");
    let boundary = "merpati-boundary";
    let payload = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"image\"; filename=\"a.png\"\r\n\
         Content-Type: image/png\r\n\r\n\
         png-bytes\r\n\
         --{boundary}--\r\n"
    );

    let req = test::TestRequest::post()
        .uri("/api/upload")
        .insert_header((header::AUTHORIZATION, token))
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        ))
        .set_payload(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

/// Accepts every upload and echoes what it received in the URL.
struct EchoStorage;

#[async_trait]
impl MediaStorage for EchoStorage {
    async fn upload(&self, request: UploadRequest) -> Result<String, MediaError> {
        Ok(format!(
            "https://cdn.example.com/{}?type={}&size={}",
            request.file_name,
            request.content_type.unwrap_or_default(),
            request.bytes.len()
        ))
    }
}

#[actix_rt::test]
async fn test_upload_returns_stored_url() {
    let mut state = AppState::in_memory(jwt_config()).expect("state");
    state.media = Some(Arc::new(EchoStorage));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes)
            .default_service(web::to(not_found)),
    )
    .await;
    let token = bearer!(app, "uploader@example.com");
    let boundary = "merpati-boundary";
    let payload = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"image\"; filename=\"cover.png\"\r\n\
         Content-Type: image/png\r\n\r\n\
         png-bytes\r\n\
         --{boundary}--\r\n"
    );

    let req = test::TestRequest::post()
        .uri("/api/upload")
        .insert_header((header::AUTHORIZATION, token))
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        ))
        .set_payload(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "success");
    assert_eq!(
        body["data"]["url"],
        "https://cdn.example.com/cover.png?type=image/png&size=9"
    );
}
