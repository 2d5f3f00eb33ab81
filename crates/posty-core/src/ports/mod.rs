//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod cache;
mod media;
mod rate_limit;
mod repository;

pub use auth::{AuthError, PasswordService};
pub use cache::{Cache, CacheError};
pub use media::{MediaError, MediaStorage};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::{
    BaseRepository, CommentRepository, FollowRepository, GroupRepository, PostRepository,
    UserRepository,
};
