//! Post handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use merpati_core::domain::{Page, PageRequest, Post, PostInput, PostStatus};
use merpati_shared::dto::{AuthorResponse, ListQuery, PostRequest, PostResponse, TagResponse};
use merpati_shared::{ApiResponse, PaginationMeta};

use crate::middleware::auth::AuthenticatedCaller;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn to_response(post: Post) -> PostResponse {
    PostResponse {
        id: post.id,
        title: post.title,
        content: post.content,
        category: post.category,
        status: post.status.to_string(),
        featured_image_url: post.featured_image_url,
        author_id: post.author_id,
        author: post.author.map(|a| AuthorResponse {
            id: a.id,
            full_name: a.full_name,
            email: a.email,
        }),
        tags: post
            .tags
            .into_iter()
            .map(|t| TagResponse {
                id: t.id,
                name: t.name,
            })
            .collect(),
        created_at: post.created_at,
        updated_at: post.updated_at,
        deleted_at: post.deleted_at,
    }
}

fn to_input(req: PostRequest) -> PostInput {
    PostInput {
        title: req.title,
        content: req.content,
        category: req.category,
        status: req.status,
        featured_image_url: req.featured_image_url,
        tags: req.tags,
    }
}

fn page_response(message: &str, page: Page<Post>) -> HttpResponse {
    let meta = PaginationMeta {
        total: page.total,
        limit: page.limit,
        offset: page.offset,
    };
    let items: Vec<PostResponse> = page.items.into_iter().map(to_response).collect();

    HttpResponse::Ok().json(ApiResponse::ok(message, items).with_meta(meta))
}

fn status_filter(query: &ListQuery) -> AppResult<Option<PostStatus>> {
    match query.status.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => Ok(Some(raw.parse::<PostStatus>()?)),
    }
}

fn page_request(query: &ListQuery) -> PageRequest {
    PageRequest::new(query.limit, query.offset)
}

fn post_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("invalid post id".to_string()))
}

/// GET /api/posts
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let status = status_filter(&query)?;
    let page = state.posts.list(status, page_request(&query)).await?;

    Ok(page_response("posts retrieved successfully", page))
}

/// GET /api/posts/my
pub async fn list_mine(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let page = state.posts.list_mine(caller.id, page_request(&query)).await?;

    Ok(page_response("your posts retrieved successfully", page))
}

/// GET /api/admin/posts
pub async fn list_for_admin(
    state: web::Data<AppState>,
    _caller: AuthenticatedCaller,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let status = status_filter(&query)?;
    let page = state
        .posts
        .list_for_admin(status, page_request(&query))
        .await?;

    Ok(page_response("posts retrieved successfully", page))
}

/// GET /api/posts/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let id = post_id(&path)?;
    let post = state.posts.get_by_id(id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok("post retrieved successfully", to_response(post))))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .create(caller.id, to_input(body.into_inner()))
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok("post created successfully", to_response(post))))
}

/// PUT /api/posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    path: web::Path<String>,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let id = post_id(&path)?;
    let post = state
        .posts
        .update(id, caller.id, to_input(body.into_inner()))
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok("post updated successfully", to_response(post))))
}

/// DELETE /api/posts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = post_id(&path)?;
    state.posts.delete(id, caller.id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("post deleted successfully")))
}
