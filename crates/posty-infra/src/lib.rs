//! # Posty Infrastructure
//!
//! Concrete implementations of the ports defined in `posty-core`.
//! This crate contains database, cache, media and authentication adapters.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory adapters only
//! - `postgres` - PostgreSQL repositories via SeaORM
//! - `auth` - Argon2 password hashing
//! - `rate-limit` - Rate limiting via governor
//! - `redis` - Redis page cache

pub mod cache;
pub mod database;
pub mod media;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-exports - In-Memory
pub use cache::InMemoryCache;
pub use database::InMemoryDatabase;
pub use media::{InMemoryMediaStorage, LocalMediaStorage};

#[cfg(feature = "auth")]
pub use auth::Argon2PasswordService;

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
