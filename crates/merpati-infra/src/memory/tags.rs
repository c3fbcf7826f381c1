use async_trait::async_trait;

use merpati_core::domain::TagResolution;
use merpati_core::error::RepoError;
use merpati_core::ports::TagRepository;

use super::MemoryStore;

pub struct InMemoryTagRepository {
    store: MemoryStore,
}

impl InMemoryTagRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TagRepository for InMemoryTagRepository {
    async fn resolve_or_create(&self, names: &[String]) -> Result<TagResolution, RepoError> {
        Ok(self.store.tables.write().await.resolve_tags(names))
    }
}
