//! Application state - shared across all handlers.

use std::sync::Arc;

use merpati_core::ports::{
    MediaStorage, PostRepository, TagRepository, TokenService, UserRepository,
};
use merpati_core::services::{CredentialService, PostService};
use merpati_infra::auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
use merpati_infra::memory::{
    InMemoryPostRepository, InMemoryTagRepository, InMemoryUserRepository, MemoryStore,
};

#[cfg(feature = "postgres")]
use merpati_infra::database::{
    DatabaseConfig, DatabaseConnections, PostgresPostRepository, PostgresTagRepository,
    PostgresUserRepository,
};

use crate::config::AppConfig;

/// The three repositories every service is built from.
struct Repositories {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    tags: Arc<dyn TagRepository>,
}

impl Repositories {
    fn in_memory() -> Self {
        let store = MemoryStore::new();
        Self {
            users: Arc::new(InMemoryUserRepository::new(store.clone())),
            posts: Arc::new(InMemoryPostRepository::new(store.clone())),
            tags: Arc::new(InMemoryTagRepository::new(store)),
        }
    }

    #[cfg(feature = "postgres")]
    fn postgres(db: &DatabaseConnections) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(db.main.clone())),
            posts: Arc::new(PostgresPostRepository::new(db.main.clone())),
            tags: Arc::new(PostgresTagRepository::new(db.main.clone())),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialService>,
    pub posts: Arc<PostService>,
    pub tokens: Arc<dyn TokenService>,
    pub media: Option<Arc<dyn MediaStorage>>,
    #[cfg(feature = "postgres")]
    pub db: Option<DatabaseConnections>,
    /// False when the process runs degraded (store unreachable, or the
    /// default signing secret in production).
    pub ready: bool,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn build(config: &AppConfig) -> anyhow::Result<Self> {
        let mut ready = true;

        if config.jwt.uses_default_secret() {
            if config.is_production() {
                tracing::error!("JWT_SECRET is not set in production; refusing to report ready");
                ready = false;
            } else {
                tracing::warn!("JWT_SECRET not set. Using the development default.");
            }
        }

        #[cfg(feature = "postgres")]
        let (db, repos) = match connect(config.database.as_ref()).await {
            Some((db, migrated)) => {
                ready &= migrated;
                let repos = Repositories::postgres(&db);
                (Some(db), repos)
            }
            None => {
                ready &= config.database.is_none() && !config.is_production();
                (None, Repositories::in_memory())
            }
        };

        #[cfg(not(feature = "postgres"))]
        let repos = {
            tracing::info!("Running without postgres feature - using in-memory repositories");
            Repositories::in_memory()
        };

        let mut state = Self::assemble(repos, config.jwt.clone(), ready)?;
        state.media = media_storage(config);
        #[cfg(feature = "postgres")]
        {
            state.db = db;
        }

        tracing::info!(ready = state.ready, "Application state initialized");
        Ok(state)
    }

    /// State backed only by in-memory repositories. Used when no database is
    /// configured and by the HTTP tests.
    pub fn in_memory(jwt: JwtConfig) -> anyhow::Result<Self> {
        Self::assemble(Repositories::in_memory(), jwt, true)
    }

    fn assemble(repos: Repositories, jwt: JwtConfig, ready: bool) -> anyhow::Result<Self> {
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(jwt));
        let credentials = CredentialService::new(
            repos.users,
            Arc::new(Argon2PasswordService::new()),
            tokens.clone(),
        )?;

        Ok(Self {
            credentials: Arc::new(credentials),
            posts: Arc::new(PostService::new(repos.posts, repos.tags)),
            tokens,
            media: None,
            #[cfg(feature = "postgres")]
            db: None,
            ready,
        })
    }

    /// Live readiness: the startup verdict plus a store ping.
    pub async fn is_ready(&self) -> bool {
        #[cfg(feature = "postgres")]
        if let Some(db) = &self.db {
            if let Err(e) = db.ping().await {
                tracing::warn!(error = %e, "Database ping failed");
                return false;
            }
        }
        self.ready
    }
}

/// Connect and migrate. Returns the pool and whether migrations succeeded,
/// or `None` when no database is configured or it cannot be reached.
#[cfg(feature = "postgres")]
async fn connect(config: Option<&DatabaseConfig>) -> Option<(DatabaseConnections, bool)> {
    use migration::{Migrator, MigratorTrait};

    let Some(config) = config else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        return None;
    };

    let db = match DatabaseConnections::init(config).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(
                "Failed to connect to database: {}. Using in-memory fallback.",
                e
            );
            return None;
        }
    };

    match Migrator::up(&db.main, None).await {
        Ok(()) => {
            tracing::info!("Database migrations applied");
            Some((db, true))
        }
        Err(e) => {
            tracing::error!("Failed to run migrations: {}", e);
            Some((db, false))
        }
    }
}

#[cfg(feature = "media")]
fn media_storage(config: &AppConfig) -> Option<Arc<dyn MediaStorage>> {
    use merpati_infra::media::{CloudinaryConfig, CloudinaryStorage};

    let Some(media) = &config.media else {
        tracing::warn!("Cloudinary credentials not set. Image upload disabled.");
        return None;
    };

    let cloudinary = CloudinaryConfig {
        folder: media.folder.clone(),
        timeout: media.timeout,
        ..CloudinaryConfig::new(&media.cloud_name, &media.api_key, &media.api_secret)
    };

    match CloudinaryStorage::new(cloudinary) {
        Ok(storage) => Some(Arc::new(storage)),
        Err(e) => {
            tracing::error!("Failed to initialize Cloudinary storage: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "media"))]
fn media_storage(_config: &AppConfig) -> Option<Arc<dyn MediaStorage>> {
    tracing::info!("Running without media feature - image upload disabled");
    None
}
