//! Tag find-or-create.
//!
//! Tag names are unique at the storage layer. Creation races are settled by
//! `INSERT .. ON CONFLICT (name) DO NOTHING` followed by a re-read, so two
//! requests introducing the same new name always end up sharing one row.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, DbConn, DbErr, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use merpati_core::domain::TagResolution;
use merpati_core::error::RepoError;
use merpati_core::ports::TagRepository;

use super::entity::tag;
use super::postgres_base::repo_err;

/// Attempts per name before giving up on a row that keeps disappearing.
const MAX_ATTEMPTS: usize = 3;

/// How a failure on one name affects the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolvePolicy {
    /// Log, record the name as failed and continue with the rest.
    SkipFailed,
    /// Abort on the first failure. Used inside transactions, where a failed
    /// statement poisons everything after it anyway.
    Strict,
}

/// Find the tag called `name`, creating it if needed.
pub(crate) async fn resolve_one<C>(conn: &C, name: &str) -> Result<tag::Model, DbErr>
where
    C: ConnectionTrait,
{
    for attempt in 1..=MAX_ATTEMPTS {
        if let Some(found) = find_tag(conn, name).await? {
            return Ok(found);
        }

        let candidate = tag::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
        };
        let inserted = tag::Entity::insert(candidate)
            .on_conflict(OnConflict::column(tag::Column::Name).do_nothing().to_owned())
            .exec_without_returning(conn)
            .await?;

        if inserted == 0 {
            tracing::debug!(tag = name, attempt, "Tag created concurrently; re-reading");
        }

        if let Some(found) = find_tag(conn, name).await? {
            return Ok(found);
        }
    }

    // Not `RecordNotFound`: callers would read that as a missing post.
    Err(DbErr::Custom(format!(
        "tag '{name}' could not be resolved after {MAX_ATTEMPTS} attempts"
    )))
}

async fn find_tag<C>(conn: &C, name: &str) -> Result<Option<tag::Model>, DbErr>
where
    C: ConnectionTrait,
{
    tag::Entity::find()
        .filter(tag::Column::Name.eq(name))
        .one(conn)
        .await
}

/// Resolve a batch of normalized names under the given policy.
pub(crate) async fn resolve_tags<C>(
    conn: &C,
    names: &[String],
    policy: ResolvePolicy,
) -> Result<TagResolution, DbErr>
where
    C: ConnectionTrait,
{
    let mut resolution = TagResolution::default();

    for name in names {
        match resolve_one(conn, name).await {
            Ok(model) => {
                if !resolution.tags.iter().any(|t| t.id == model.id) {
                    resolution.tags.push(model.into());
                }
            }
            Err(e) if policy == ResolvePolicy::SkipFailed => {
                tracing::warn!(tag = %name, error = %e, "Failed to resolve tag; skipping");
                resolution.failed.push(name.clone());
            }
            Err(e) => return Err(e),
        }
    }

    Ok(resolution)
}

/// PostgreSQL tag repository.
pub struct PostgresTagRepository {
    db: DbConn,
}

impl PostgresTagRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TagRepository for PostgresTagRepository {
    async fn resolve_or_create(&self, names: &[String]) -> Result<TagResolution, RepoError> {
        resolve_tags(&self.db, names, ResolvePolicy::SkipFailed)
            .await
            .map_err(repo_err)
    }
}
