use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Comment, Group, Page, PageRequest, Post, PostFilter, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID, cascading to dependent records.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Load several users at once; unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError>;
}

/// Group repository.
#[async_trait]
pub trait GroupRepository: BaseRepository<Group, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Group>, RepoError>;

    /// All groups ordered by title.
    async fn list_all(&self) -> Result<Vec<Group>, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// One page of posts matching `filter`, newest first.
    async fn find_page(
        &self,
        filter: PostFilter,
        request: &PageRequest,
    ) -> Result<Page<Post>, RepoError>;

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments on a post, oldest first.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;
}

/// Follow edges between users.
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Create the edge unless it exists. Returns whether a row was created.
    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;

    /// Remove the edge if present. Returns whether a row was removed.
    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;

    /// Number of users following `author_id`.
    async fn count_followers(&self, author_id: Uuid) -> Result<u64, RepoError>;

    /// Number of authors `user_id` follows.
    async fn count_following(&self, user_id: Uuid) -> Result<u64, RepoError>;

    /// Total number of follow edges.
    async fn count(&self) -> Result<u64, RepoError>;
}
