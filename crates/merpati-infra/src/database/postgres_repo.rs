//! PostgreSQL repository implementations.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseTransaction, DbConn,
    DbErr, EntityTrait, IntoActiveModel, LoaderTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set, TransactionTrait,
};
use uuid::Uuid;

use merpati_core::domain::{
    NewPost, Page, PageRequest, Post, PostDraft, PostFilter, Tag, User, mask_email,
};
use merpati_core::error::RepoError;
use merpati_core::ports::{PostRepository, UserRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_tag;
use super::entity::tag;
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, repo_err};
use super::tag_resolver::{ResolvePolicy, resolve_tags};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }
}

/// PostgreSQL post store.
pub struct PostgresPostRepository {
    db: DbConn,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    async fn fetch_view(&self, id: Uuid, include_deleted: bool) -> Result<Option<Post>, DbErr> {
        let mut query = PostEntity::find_by_id(id);
        if !include_deleted {
            query = query.filter(post::Column::DeletedAt.is_null());
        }

        match query.one(&self.db).await? {
            Some(model) => Ok(load_views(&self.db, vec![model]).await?.pop()),
            None => Ok(None),
        }
    }
}

fn filtered(filter: &PostFilter) -> Select<PostEntity> {
    let mut query = PostEntity::find();
    if !filter.include_deleted {
        query = query.filter(post::Column::DeletedAt.is_null());
    }
    if let Some(status) = filter.status {
        query = query.filter(post::Column::Status.eq(post::Status::from(status)));
    }
    if let Some(author_id) = filter.author_id {
        query = query.filter(post::Column::AuthorId.eq(author_id));
    }
    query
}

/// Join posts with their authors and tags.
async fn load_views<C>(conn: &C, posts: Vec<post::Model>) -> Result<Vec<Post>, DbErr>
where
    C: ConnectionTrait,
{
    let authors = posts.load_one(UserEntity, conn).await?;
    let tags = posts
        .load_many_to_many(tag::Entity, post_tag::Entity, conn)
        .await?;

    Ok(posts
        .into_iter()
        .zip(authors)
        .zip(tags)
        .map(|((model, author), tags)| into_domain(model, author, tags))
        .collect())
}

fn into_domain(model: post::Model, author: Option<user::Model>, tags: Vec<tag::Model>) -> Post {
    let mut tags: Vec<Tag> = tags.into_iter().map(Into::into).collect();
    tags.sort_by(|a, b| a.name.cmp(&b.name));

    Post {
        id: model.id,
        title: model.title,
        content: model.content,
        category: model.category,
        status: model.status.into(),
        featured_image_url: model.featured_image_url,
        author_id: model.author_id,
        author: author.map(Into::into),
        tags,
        created_at: model.created_at.into(),
        updated_at: model.updated_at.into(),
        deleted_at: model.deleted_at.map(Into::into),
    }
}

async fn insert_links<C>(conn: &C, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if tag_ids.is_empty() {
        return Ok(());
    }

    post_tag::Entity::insert_many(tag_ids.iter().map(|tag_id| post_tag::ActiveModel {
        post_id: Set(post_id),
        tag_id: Set(*tag_id),
    }))
    .exec_without_returning(conn)
    .await?;

    Ok(())
}

/// The three steps of an update, run on one transaction.
async fn apply_update(txn: &DatabaseTransaction, id: Uuid, draft: PostDraft) -> Result<(), DbErr> {
    let mut query = PostEntity::find_by_id(id).filter(post::Column::DeletedAt.is_null());
    if txn.get_database_backend() == DatabaseBackend::Postgres {
        // Serializes concurrent updates of one post so two tag replaces
        // cannot interleave into a union.
        query = query.lock_exclusive();
    }
    let existing = query
        .one(txn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("post {id}")))?;

    // 1. resolve or create every requested tag
    let resolution = resolve_tags(txn, &draft.tag_names, ResolvePolicy::Strict).await?;
    let wanted: HashSet<Uuid> = resolution.ids().into_iter().collect();

    // 2. set-replace the associations
    let current: HashSet<Uuid> = post_tag::Entity::find()
        .filter(post_tag::Column::PostId.eq(id))
        .all(txn)
        .await?
        .into_iter()
        .map(|link| link.tag_id)
        .collect();

    let stale: Vec<Uuid> = current.difference(&wanted).copied().collect();
    if !stale.is_empty() {
        post_tag::Entity::delete_many()
            .filter(post_tag::Column::PostId.eq(id))
            .filter(post_tag::Column::TagId.is_in(stale))
            .exec(txn)
            .await?;
    }

    let added: Vec<Uuid> = resolution
        .ids()
        .into_iter()
        .filter(|tag_id| !current.contains(tag_id))
        .collect();
    insert_links(txn, id, &added).await?;

    // 3. overwrite fields and bump updated_at
    let fields = draft.fields;
    let mut active = existing.into_active_model();
    active.title = Set(fields.title);
    active.content = Set(fields.content);
    active.category = Set(fields.category);
    active.status = Set(fields.status.into());
    active.featured_image_url = Set(fields.featured_image_url);
    active.updated_at = Set(Utc::now().into());
    active.update(txn).await?;

    Ok(())
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, new_post: NewPost) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(repo_err)?;

        post::ActiveModel::from(&new_post)
            .insert(&txn)
            .await
            .map_err(repo_err)?;
        insert_links(&txn, new_post.id, &new_post.tag_ids)
            .await
            .map_err(repo_err)?;

        txn.commit().await.map_err(repo_err)?;

        // Association writes do not populate the relation, so re-read.
        self.fetch_view(new_post.id, false)
            .await
            .map_err(repo_err)?
            .ok_or(RepoError::NotFound)
    }

    async fn find_by_id(&self, id: Uuid, include_deleted: bool) -> Result<Option<Post>, RepoError> {
        self.fetch_view(id, include_deleted).await.map_err(repo_err)
    }

    async fn list(&self, filter: &PostFilter, page: PageRequest) -> Result<Page<Post>, RepoError> {
        // Counted separately from the page; inserts in between may make the
        // two momentarily disagree.
        let total = filtered(filter).count(&self.db).await.map_err(repo_err)?;

        let models = filtered(filter)
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        let posts = load_views(&self.db, models).await.map_err(repo_err)?;
        Ok(Page::new(posts, total, page))
    }

    async fn update_with_tags(&self, id: Uuid, draft: PostDraft) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(repo_err)?;

        if let Err(e) = apply_update(&txn, id, draft).await {
            tracing::warn!(post_id = %id, error = %e, "Post update failed; rolling back");
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(post_id = %id, "Rollback failed: {}", rollback_err);
            }
            return Err(repo_err(e));
        }

        txn.commit().await.map_err(repo_err)?;

        self.fetch_view(id, false)
            .await
            .map_err(repo_err)?
            .ok_or(RepoError::NotFound)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), RepoError> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();

        let result = PostEntity::update_many()
            .col_expr(post::Column::DeletedAt, Expr::value(now))
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(repo_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
