//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use posty_core::domain::pagination::DEFAULT_PER_PAGE;
use posty_infra::database::DatabaseConfig;
use posty_infra::rate_limit::RateLimitConfig;

#[cfg(feature = "redis")]
use posty_infra::cache::RedisConfig;

/// Settings handlers read on every request.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub media_root: PathBuf,
    pub max_upload_bytes: usize,
    pub page_size: u64,
    pub index_cache_ttl: Duration,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("media"),
            max_upload_bytes: 5 * 1024 * 1024,
            page_size: DEFAULT_PER_PAGE,
            index_cache_ttl: Duration::from_secs(20),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub run_migrations: bool,
    #[cfg(feature = "redis")]
    pub redis: Option<RedisConfig>,
    /// Session cookie signing/encryption key, at least 64 bytes.
    pub secret_key: Option<String>,
    pub cookie_secure: bool,
    pub login_rate_limit: RateLimitConfig,
    pub cache_sweep_enabled: bool,
    pub site: SiteSettings,
}

fn var_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}

fn var_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| {
            let mut config = DatabaseConfig::new(url);
            if let Some(max) = var_parsed("DB_MAX_CONNECTIONS") {
                config.max_connections = max;
            }
            if let Some(min) = var_parsed("DB_MIN_CONNECTIONS") {
                config.min_connections = min;
            }
            config
        });

        let site_defaults = SiteSettings::default();
        let site = SiteSettings {
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(site_defaults.media_root),
            max_upload_bytes: var_parsed("MAX_UPLOAD_BYTES")
                .unwrap_or(site_defaults.max_upload_bytes),
            page_size: var_parsed("PAGE_SIZE").unwrap_or(site_defaults.page_size),
            index_cache_ttl: var_parsed("INDEX_CACHE_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(site_defaults.index_cache_ttl),
        };

        let limit_defaults = RateLimitConfig::default();
        let login_rate_limit = RateLimitConfig {
            max_requests: var_parsed("LOGIN_RATE_LIMIT_MAX")
                .unwrap_or(limit_defaults.max_requests),
            window: var_parsed("LOGIN_RATE_LIMIT_WINDOW_SECS")
                .map(Duration::from_secs)
                .unwrap_or(limit_defaults.window),
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: var_parsed("PORT").unwrap_or(8080),
            database,
            run_migrations: var_flag("RUN_MIGRATIONS", false),
            #[cfg(feature = "redis")]
            redis: env::var("REDIS_URL").ok().map(|_| RedisConfig::from_env()),
            secret_key: env::var("SECRET_KEY").ok(),
            cookie_secure: var_flag("COOKIE_SECURE", false),
            login_rate_limit,
            cache_sweep_enabled: var_flag("CACHE_SWEEP_ENABLED", true),
            site,
        }
    }
}
