use std::sync::Arc;

use merpati_core::domain::{PageRequest, PostInput, User};
use merpati_core::error::{DomainError, RepoError};
use merpati_core::ports::{BaseRepository, UserRepository};
use merpati_core::services::PostService;

use super::*;

fn input(title: &str, tags: &[&str]) -> PostInput {
    PostInput {
        title: format!("{title} - a sufficiently long title"),
        content: "y".repeat(200),
        category: "notes".to_string(),
        status: "draft".to_string(),
        featured_image_url: None,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

async fn setup() -> (MemoryStore, PostService, User) {
    let store = MemoryStore::new();
    let users = InMemoryUserRepository::new(store.clone());
    let author = users
        .insert(User::new("Mem Author".into(), "mem@example.com".into(), "h".into()))
        .await
        .unwrap();
    let service = PostService::new(
        Arc::new(InMemoryPostRepository::new(store.clone())),
        Arc::new(InMemoryTagRepository::new(store.clone())),
    );
    (store, service, author)
}

#[tokio::test]
async fn test_user_email_is_unique() {
    let users = InMemoryUserRepository::new(MemoryStore::new());
    users
        .insert(User::new("One".into(), "same@example.com".into(), "h".into()))
        .await
        .unwrap();

    let result = users
        .insert(User::new("Two".into(), "same@example.com".into(), "h".into()))
        .await;

    assert!(matches!(result, Err(RepoError::Constraint(_))));
    assert!(users.find_by_email("same@example.com").await.unwrap().is_some());
}

#[tokio::test]
async fn test_tags_are_shared_and_replaced() {
    let (store, service, author) = setup().await;

    let a = service.create(author.id, input("First", &["go"])).await.unwrap();
    let b = service.create(author.id, input("Second", &["GO", "web"])).await.unwrap();
    assert_eq!(a.tags[0].id, b.tags[0].id);

    let updated = service
        .update(b.id, author.id, input("Second edited", &["web", "rust"]))
        .await
        .unwrap();
    assert_eq!(updated.tag_names(), vec!["rust", "web"]);

    // orphaned tag rows survive
    let tables = store.tables.read().await;
    assert!(tables.tags.values().any(|t| t.name == "go"));
}

#[tokio::test]
async fn test_soft_deleted_posts_only_visible_to_admin() {
    let (_, service, author) = setup().await;

    let post = service.create(author.id, input("Gone", &[])).await.unwrap();
    service.delete(post.id, author.id).await.unwrap();

    assert!(matches!(
        service.get_by_id(post.id).await,
        Err(DomainError::NotFound { .. })
    ));
    assert_eq!(service.list_mine(author.id, PageRequest::default()).await.unwrap().total, 0);
    assert_eq!(
        service.list_for_admin(None, PageRequest::default()).await.unwrap().total,
        1
    );
}
