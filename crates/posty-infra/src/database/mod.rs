//! Repositories: PostgreSQL via SeaORM and an in-memory fallback.

mod connections;
mod memory_repo;

#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;

#[cfg(feature = "postgres")]
pub mod entity;

pub use connections::DatabaseConfig;
pub use memory_repo::InMemoryDatabase;

#[cfg(feature = "postgres")]
pub use connections::connect;
#[cfg(feature = "postgres")]
pub use sea_orm::DbConn;

#[cfg(feature = "postgres")]
pub use postgres_repo::{
    PostgresCommentRepository, PostgresFollowRepository, PostgresGroupRepository,
    PostgresPostRepository, PostgresUserRepository,
};

#[cfg(feature = "postgres")]
#[cfg(test)]
mod tests;
