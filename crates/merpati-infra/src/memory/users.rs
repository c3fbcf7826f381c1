use async_trait::async_trait;
use uuid::Uuid;

use merpati_core::domain::User;
use merpati_core::error::RepoError;
use merpati_core::ports::{BaseRepository, UserRepository};

use super::MemoryStore;

pub struct InMemoryUserRepository {
    store: MemoryStore,
}

impl InMemoryUserRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.store.tables.read().await.users.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.store.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }
}
