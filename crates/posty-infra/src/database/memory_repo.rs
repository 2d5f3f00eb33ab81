//! In-memory repositories - used when no database is configured, and by tests.
//!
//! All tables live behind one async RwLock so cascades are applied
//! atomically, matching the foreign-key behaviour of the PostgreSQL schema:
//! deleting a user removes their posts, comments and follow edges; deleting
//! a post removes its comments; deleting a group clears it from its posts.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use posty_core::domain::{Comment, Follow, Group, Page, PageRequest, Post, PostFilter, User};
use posty_core::error::RepoError;
use posty_core::ports::{
    BaseRepository, CommentRepository, FollowRepository, GroupRepository, PostRepository,
    UserRepository,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    groups: HashMap<Uuid, Group>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
    follows: Vec<Follow>,
}

impl Tables {
    fn post_matches(&self, post: &Post, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(group_id) => post.group_id == Some(group_id),
            PostFilter::Author(author_id) => post.author_id == author_id,
            PostFilter::FollowedBy(user_id) => self
                .follows
                .iter()
                .any(|f| f.user_id == user_id && f.author_id == post.author_id),
        }
    }

    fn check_post_refs(&self, post: &Post) -> Result<(), RepoError> {
        if !self.users.contains_key(&post.author_id) {
            return Err(RepoError::Constraint("post author does not exist".to_string()));
        }
        if let Some(group_id) = post.group_id {
            if !self.groups.contains_key(&group_id) {
                return Err(RepoError::Constraint("post group does not exist".to_string()));
            }
        }
        Ok(())
    }

    fn remove_post(&mut self, post_id: Uuid) -> bool {
        let removed = self.posts.remove(&post_id).is_some();
        if removed {
            self.comments.retain(|_, c| c.post_id != post_id);
        }
        removed
    }
}

/// Every repository port backed by process memory.
#[derive(Default)]
pub struct InMemoryDatabase {
    tables: RwLock<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored posts.
    pub async fn post_count(&self) -> usize {
        self.tables.read().await.posts.len()
    }

    /// Number of stored comments.
    pub async fn comment_count(&self) -> usize {
        self.tables.read().await.comments.len()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryDatabase {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.id)
            || tables.users.values().any(|u| u.username == user.username)
        {
            return Err(RepoError::Constraint("username already taken".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Err(RepoError::NotFound);
        }
        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(RepoError::Constraint("username already taken".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }

        let owned: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in owned {
            tables.remove_post(post_id);
        }
        tables.comments.retain(|_, c| c.author_id != id);
        tables.follows.retain(|f| f.user_id != id && f.author_id != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryDatabase {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl BaseRepository<Group, Uuid> for InMemoryDatabase {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, RepoError> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn insert(&self, group: Group) -> Result<Group, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.groups.values().any(|g| g.slug == group.slug) {
            return Err(RepoError::Constraint(format!(
                "group slug '{}' already exists",
                group.slug
            )));
        }
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn update(&self, group: Group) -> Result<Group, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.groups.contains_key(&group.id) {
            return Err(RepoError::NotFound);
        }
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.groups.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        for post in tables.posts.values_mut() {
            if post.group_id == Some(id) {
                post.group_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for InMemoryDatabase {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Group>, RepoError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.groups.get(id).cloned())
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Group>, RepoError> {
        let tables = self.tables.read().await;
        let mut groups: Vec<Group> = tables.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryDatabase {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        tables.check_post_refs(&post)?;
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post.id) {
            return Err(RepoError::NotFound);
        }
        tables.check_post_refs(&post)?;
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.remove_post(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryDatabase {
    async fn find_page(
        &self,
        filter: PostFilter,
        request: &PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<&Post> = tables
            .posts
            .values()
            .filter(|p| tables.post_matches(p, filter))
            .collect();
        matching.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let number = request.resolve(total);
        let items = matching
            .into_iter()
            .skip(request.offset(number) as usize)
            .take(request.per_page as usize)
            .cloned()
            .collect();

        Ok(Page::new(items, number, total, request))
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .values()
            .filter(|p| p.author_id == author_id)
            .count() as u64)
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryDatabase {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn insert(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(RepoError::Constraint("comment post does not exist".to_string()));
        }
        if !tables.users.contains_key(&comment.author_id) {
            return Err(RepoError::Constraint(
                "comment author does not exist".to_string(),
            ));
        }
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.comments.contains_key(&comment.id) {
            return Err(RepoError::NotFound);
        }
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables
            .comments
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl CommentRepository for InMemoryDatabase {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created.cmp(&b.created));
        Ok(comments)
    }
}

#[async_trait]
impl FollowRepository for InMemoryDatabase {
    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) || !tables.users.contains_key(&author_id) {
            return Err(RepoError::Constraint("follow edge endpoint does not exist".to_string()));
        }
        if tables
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id)
        {
            return Ok(false);
        }
        tables.follows.push(Follow::new(user_id, author_id));
        Ok(true)
    }

    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        Ok(tables.follows.len() < before)
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id))
    }

    async fn count_followers(&self, author_id: Uuid) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.follows.iter().filter(|f| f.author_id == author_id).count() as u64)
    }

    async fn count_following(&self, user_id: Uuid) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.follows.iter().filter(|f| f.user_id == user_id).count() as u64)
    }

    async fn count(&self) -> Result<u64, RepoError> {
        Ok(self.tables.read().await.follows.len() as u64)
    }
}
