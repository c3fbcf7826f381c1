use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use merpati_core::domain::{Post, PostFields, Tag, TagResolution, User};

/// A post row without its joined author and tags.
#[derive(Debug, Clone)]
pub(super) struct PostRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub fields: PostFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub(super) struct Tables {
    pub users: HashMap<Uuid, User>,
    pub tags: HashMap<Uuid, Tag>,
    pub posts: HashMap<Uuid, PostRow>,
    pub post_tags: BTreeSet<(Uuid, Uuid)>,
}

impl Tables {
    /// Find or create a tag under the unique-name rule.
    pub fn resolve_tag(&mut self, name: &str) -> Tag {
        if let Some(existing) = self.tags.values().find(|t| t.name == name) {
            return existing.clone();
        }
        let tag = Tag::new(name);
        self.tags.insert(tag.id, tag.clone());
        tag
    }

    pub fn resolve_tags(&mut self, names: &[String]) -> TagResolution {
        let mut resolution = TagResolution::default();
        for name in names {
            let tag = self.resolve_tag(name);
            if !resolution.tags.iter().any(|t| t.id == tag.id) {
                resolution.tags.push(tag);
            }
        }
        resolution
    }

    /// Join a row with its author and tags.
    pub fn view(&self, row: &PostRow) -> Post {
        let mut tags: Vec<Tag> = self
            .post_tags
            .iter()
            .filter(|(post_id, _)| *post_id == row.id)
            .filter_map(|(_, tag_id)| self.tags.get(tag_id).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));

        Post {
            id: row.id,
            title: row.fields.title.clone(),
            content: row.fields.content.clone(),
            category: row.fields.category.clone(),
            status: row.fields.status,
            featured_image_url: row.fields.featured_image_url.clone(),
            author_id: row.author_id,
            author: self.users.get(&row.author_id).map(User::summary),
            tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// Tables shared by the in-memory repositories. A single lock guards all
/// of them, so multi-table writes are atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub(super) tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}
