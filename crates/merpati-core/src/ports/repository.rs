use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{NewPost, Page, PageRequest, Post, PostDraft, PostFilter, TagResolution, User};
use crate::error::RepoError;

/// Generic repository trait for entities addressed by a primary key.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Uniqueness violations surface as
    /// [`RepoError::Constraint`].
    async fn insert(&self, entity: T) -> Result<T, RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

/// Tag lookup and lazy creation.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Map each (already normalized) name to a tag, creating missing ones.
    /// A name that fails is logged and reported in
    /// [`TagResolution::failed`]; the remaining names still resolve.
    async fn resolve_or_create(&self, names: &[String]) -> Result<TagResolution, RepoError>;
}

/// Post store.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Persist a post together with its tag associations, returning the
    /// joined view.
    async fn create(&self, post: NewPost) -> Result<Post, RepoError>;

    /// Fetch a post with author and tags. Soft-deleted posts are only
    /// returned when `include_deleted` is set.
    async fn find_by_id(&self, id: Uuid, include_deleted: bool) -> Result<Option<Post>, RepoError>;

    /// Newest-first page of posts matching `filter`, with the total count.
    async fn list(&self, filter: &PostFilter, page: PageRequest) -> Result<Page<Post>, RepoError>;

    /// Atomically resolve the draft's tags, set-replace the post's tag
    /// associations and overwrite its fields. Nothing is changed on error.
    /// Returns [`RepoError::NotFound`] if the post is missing or deleted.
    async fn update_with_tags(&self, id: Uuid, draft: PostDraft) -> Result<Post, RepoError>;

    /// Mark a post as deleted. Rows and tag associations are kept.
    async fn soft_delete(&self, id: Uuid) -> Result<(), RepoError>;
}
