use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use merpati_core::domain::{NewPost, Page, PageRequest, Post, PostDraft, PostFilter};
use merpati_core::error::RepoError;
use merpati_core::ports::PostRepository;

use super::MemoryStore;
use super::store::PostRow;

pub struct InMemoryPostRepository {
    store: MemoryStore,
}

impl InMemoryPostRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, new_post: NewPost) -> Result<Post, RepoError> {
        let mut tables = self.store.tables.write().await;
        if !tables.users.contains_key(&new_post.author_id) {
            return Err(RepoError::Constraint("unknown author".to_string()));
        }
        if let Some(missing) = new_post.tag_ids.iter().find(|id| !tables.tags.contains_key(id)) {
            return Err(RepoError::Constraint(format!("unknown tag {missing}")));
        }

        let row = PostRow {
            id: new_post.id,
            author_id: new_post.author_id,
            fields: new_post.fields,
            created_at: new_post.created_at,
            updated_at: new_post.created_at,
            deleted_at: None,
        };
        for tag_id in &new_post.tag_ids {
            tables.post_tags.insert((row.id, *tag_id));
        }
        let view = tables.view(&row);
        tables.posts.insert(row.id, row);

        Ok(view)
    }

    async fn find_by_id(&self, id: Uuid, include_deleted: bool) -> Result<Option<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .posts
            .get(&id)
            .filter(|row| include_deleted || row.deleted_at.is_none())
            .map(|row| tables.view(row)))
    }

    async fn list(&self, filter: &PostFilter, page: PageRequest) -> Result<Page<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut matching: Vec<Post> = tables
            .posts
            .values()
            .map(|row| tables.view(row))
            .filter(|post| filter.matches(post))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect();

        Ok(Page::new(items, total, page))
    }

    async fn update_with_tags(&self, id: Uuid, draft: PostDraft) -> Result<Post, RepoError> {
        let mut tables = self.store.tables.write().await;
        if !tables
            .posts
            .get(&id)
            .is_some_and(|row| row.deleted_at.is_none())
        {
            return Err(RepoError::NotFound);
        }

        let resolution = tables.resolve_tags(&draft.tag_names);
        tables.post_tags.retain(|(post_id, _)| *post_id != id);
        for tag_id in resolution.ids() {
            tables.post_tags.insert((id, tag_id));
        }

        let row = tables.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        row.fields = draft.fields;
        row.updated_at = Utc::now();
        let row = row.clone();

        Ok(tables.view(&row))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        match tables.posts.get_mut(&id) {
            Some(row) if row.deleted_at.is_none() => {
                row.deleted_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(RepoError::NotFound),
        }
    }
}
