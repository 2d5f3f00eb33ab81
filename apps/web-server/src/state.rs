//! Application state - shared across all handlers.

use std::sync::Arc;

use posty_core::ports::{
    Cache, CommentRepository, FollowRepository, GroupRepository, MediaStorage, PasswordService,
    PostRepository, RateLimiter, UserRepository,
};
use posty_infra::cache::InMemoryCache;
use posty_infra::database::InMemoryDatabase;
use posty_infra::media::LocalMediaStorage;
use posty_infra::{Argon2PasswordService, InMemoryRateLimiter};

use crate::config::{AppConfig, SiteSettings};

/// One handle per repository port.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
}

impl Repositories {
    /// Every port served by one in-process store.
    pub fn in_memory(db: Arc<InMemoryDatabase>) -> Self {
        Self {
            users: db.clone(),
            groups: db.clone(),
            posts: db.clone(),
            comments: db.clone(),
            follows: db,
        }
    }

    #[cfg(feature = "postgres")]
    pub fn postgres(conn: posty_infra::database::DbConn) -> Self {
        use posty_infra::database::{
            PostgresCommentRepository, PostgresFollowRepository, PostgresGroupRepository,
            PostgresPostRepository, PostgresUserRepository,
        };

        Self {
            users: Arc::new(PostgresUserRepository::new(conn.clone())),
            groups: Arc::new(PostgresGroupRepository::new(conn.clone())),
            posts: Arc::new(PostgresPostRepository::new(conn.clone())),
            comments: Arc::new(PostgresCommentRepository::new(conn.clone())),
            follows: Arc::new(PostgresFollowRepository::new(conn)),
        }
    }
}

/// Process-local stores that need periodic sweeping.
#[cfg_attr(not(feature = "scheduler"), allow(dead_code))]
pub struct MemoryStores {
    /// The page cache, when it lives in process memory.
    pub cache: Option<Arc<InMemoryCache>>,
    pub login_limiter: Arc<InMemoryRateLimiter>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub cache: Arc<dyn Cache>,
    pub media: Arc<dyn MediaStorage>,
    pub passwords: Arc<dyn PasswordService>,
    pub login_limiter: Arc<dyn RateLimiter>,
    pub settings: SiteSettings,
}

impl AppState {
    pub fn from_parts(
        repos: Repositories,
        cache: Arc<dyn Cache>,
        media: Arc<dyn MediaStorage>,
        passwords: Arc<dyn PasswordService>,
        login_limiter: Arc<dyn RateLimiter>,
        settings: SiteSettings,
    ) -> Self {
        Self {
            users: repos.users,
            groups: repos.groups,
            posts: repos.posts,
            comments: repos.comments,
            follows: repos.follows,
            cache,
            media,
            passwords,
            login_limiter,
            settings,
        }
    }

    /// Build the application state with appropriate implementations.
    ///
    /// Also returns the in-process stores, so the caller can schedule
    /// their sweepers.
    pub async fn new(config: &AppConfig) -> anyhow::Result<(Self, MemoryStores)> {
        let repos = Self::repositories(config).await?;
        let (cache, memory_cache) = Self::cache(config).await?;

        let media: Arc<dyn MediaStorage> =
            Arc::new(LocalMediaStorage::new(config.site.media_root.clone()));
        let login_limiter = Arc::new(InMemoryRateLimiter::new(config.login_rate_limit.clone()));
        let limiter: Arc<dyn RateLimiter> = login_limiter.clone();

        tracing::info!("Application state initialized");

        let state = Self::from_parts(
            repos,
            cache,
            media,
            Arc::new(Argon2PasswordService::new()),
            limiter,
            config.site.clone(),
        );
        let stores = MemoryStores {
            cache: memory_cache,
            login_limiter,
        };
        Ok((state, stores))
    }

    /// State backed entirely by process memory.
    #[cfg(test)]
    pub fn in_memory(passwords: Arc<dyn PasswordService>, settings: SiteSettings) -> Self {
        Self::from_parts(
            Repositories::in_memory(Arc::new(InMemoryDatabase::new())),
            Arc::new(InMemoryCache::new()),
            Arc::new(posty_infra::media::InMemoryMediaStorage::new()),
            passwords,
            Arc::new(InMemoryRateLimiter::new(Default::default())),
            settings,
        )
    }

    #[cfg(feature = "postgres")]
    async fn repositories(config: &AppConfig) -> anyhow::Result<Repositories> {
        use migration::{Migrator, MigratorTrait};

        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Ok(Repositories::in_memory(Arc::new(InMemoryDatabase::new())));
        };

        let conn = posty_infra::database::connect(db_config).await?;
        if config.run_migrations {
            Migrator::up(&conn, None).await?;
            tracing::info!("Database migrations applied");
        }
        Ok(Repositories::postgres(conn))
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(config: &AppConfig) -> anyhow::Result<Repositories> {
        if config.database.is_some() {
            tracing::warn!("DATABASE_URL ignored - built without the postgres feature");
        }
        tracing::info!("Running without postgres feature - using in-memory repository");
        Ok(Repositories::in_memory(Arc::new(InMemoryDatabase::new())))
    }

    async fn cache(
        config: &AppConfig,
    ) -> anyhow::Result<(Arc<dyn Cache>, Option<Arc<InMemoryCache>>)> {
        #[cfg(feature = "redis")]
        if let Some(redis_config) = config.redis.clone() {
            let fallback = redis_config.fallback_to_memory;
            match posty_infra::cache::RedisCache::new(redis_config).await {
                Ok(redis) => {
                    let cache: Arc<dyn Cache> = Arc::new(redis);
                    return Ok((cache, None));
                }
                Err(e) if fallback => {
                    tracing::error!("Redis unavailable: {}. Using in-memory cache.", e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        #[cfg(not(feature = "redis"))]
        let _ = config;

        let memory = Arc::new(InMemoryCache::new());
        let cache: Arc<dyn Cache> = memory.clone();
        Ok((cache, Some(memory)))
    }
}
