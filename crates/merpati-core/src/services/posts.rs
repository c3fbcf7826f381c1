//! Post operations: validation, ownership checks and tag resolution
//! around the post store.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{NewPost, Page, PageRequest, Post, PostFilter, PostInput, PostStatus};
use crate::error::{DomainError, RepoError};
use crate::ports::{PostRepository, TagRepository};

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    tags: Arc<dyn TagRepository>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, tags: Arc<dyn TagRepository>) -> Self {
        Self { posts, tags }
    }

    /// Validate, resolve tags (skip-and-log) and persist a new post.
    pub async fn create(&self, author_id: Uuid, input: PostInput) -> Result<Post, DomainError> {
        let draft = input.into_draft()?;

        let resolution = self.tags.resolve_or_create(&draft.tag_names).await?;
        if resolution.failed_count() > 0 {
            tracing::warn!(
                failed = resolution.failed_count(),
                requested = draft.tag_names.len(),
                names = ?resolution.failed,
                "Some tags could not be resolved; creating post without them"
            );
        }

        let post = self
            .posts
            .create(NewPost::new(author_id, draft.fields, resolution.ids()))
            .await?;

        tracing::info!(post_id = %post.id, author_id = %author_id, "Post created");
        Ok(post)
    }

    /// Public listing: live posts, optionally filtered by status.
    pub async fn list(
        &self,
        status: Option<PostStatus>,
        page: PageRequest,
    ) -> Result<Page<Post>, DomainError> {
        Ok(self.posts.list(&PostFilter::public(status), page).await?)
    }

    /// The caller's own live posts, any status.
    pub async fn list_mine(
        &self,
        caller_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Post>, DomainError> {
        Ok(self
            .posts
            .list(&PostFilter::authored_by(caller_id), page)
            .await?)
    }

    /// Every post, including trashed and soft-deleted ones.
    pub async fn list_for_admin(
        &self,
        status: Option<PostStatus>,
        page: PageRequest,
    ) -> Result<Page<Post>, DomainError> {
        Ok(self.posts.list(&PostFilter::admin(status), page).await?)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id, false)
            .await?
            .ok_or_else(|| DomainError::post_not_found(id))
    }

    /// Replace a post's fields and tag set in one transaction.
    pub async fn update(
        &self,
        id: Uuid,
        caller_id: Uuid,
        input: PostInput,
    ) -> Result<Post, DomainError> {
        self.load_owned(id, caller_id).await?;
        let draft = input.into_draft()?;

        let post = self
            .posts
            .update_with_tags(id, draft)
            .await
            .map_err(|e| match e {
                RepoError::NotFound => DomainError::post_not_found(id),
                RepoError::Constraint(msg) => {
                    tracing::warn!(post_id = %id, "Post update hit a constraint: {}", msg);
                    DomainError::Conflict(format!(
                        "failed to update tags, constraint violation: {msg}"
                    ))
                }
                other => DomainError::from(other),
            })?;

        tracing::info!(post_id = %id, tags = post.tags.len(), "Post updated");
        Ok(post)
    }

    /// Soft-delete a post owned by the caller.
    pub async fn delete(&self, id: Uuid, caller_id: Uuid) -> Result<(), DomainError> {
        self.load_owned(id, caller_id).await?;

        self.posts.soft_delete(id).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::post_not_found(id),
            other => other.into(),
        })?;

        tracing::info!(post_id = %id, "Post soft-deleted");
        Ok(())
    }

    async fn load_owned(&self, id: Uuid, caller_id: Uuid) -> Result<Post, DomainError> {
        let post = self.get_by_id(id).await?;
        if post.author_id != caller_id {
            tracing::debug!(post_id = %id, caller_id = %caller_id, "Rejected non-author mutation");
            return Err(DomainError::Forbidden(
                "you are not authorized to modify this post".to_string(),
            ));
        }
        Ok(post)
    }
}
