//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::{OnConflict, Query};
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use uuid::Uuid;

use posty_core::domain::{Comment, Follow, Group, Page, PageRequest, Post, PostFilter, User};
use posty_core::error::RepoError;
use posty_core::ports::{
    CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::follow::{self, Entity as FollowEntity};
use super::entity::group::{self, Entity as GroupEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, repo_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL group repository.
pub type PostgresGroupRepository = PostgresBaseRepository<GroupEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// PostgreSQL follow-edge repository.
pub type PostgresFollowRepository = PostgresBaseRepository<FollowEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username = %username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let result = GroupEntity::find()
            .filter(group::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Group>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = GroupEntity::find()
            .filter(group::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn list_all(&self) -> Result<Vec<Group>, RepoError> {
        let result = GroupEntity::find()
            .order_by_asc(group::Column::Title)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

/// Base query for a post listing, newest first.
fn posts_matching(filter: PostFilter) -> Select<PostEntity> {
    let select = match filter {
        PostFilter::All => PostEntity::find(),
        PostFilter::Group(group_id) => {
            PostEntity::find().filter(post::Column::GroupId.eq(group_id))
        }
        PostFilter::Author(author_id) => {
            PostEntity::find().filter(post::Column::AuthorId.eq(author_id))
        }
        PostFilter::FollowedBy(user_id) => PostEntity::find().filter(
            post::Column::AuthorId.in_subquery(
                Query::select()
                    .column(follow::Column::AuthorId)
                    .from(FollowEntity)
                    .and_where(follow::Column::UserId.eq(user_id))
                    .to_owned(),
            ),
        ),
    };

    select
        .order_by_desc(post::Column::PubDate)
        .order_by_desc(post::Column::Id)
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_page(
        &self,
        filter: PostFilter,
        request: &PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let paginator = posts_matching(filter).paginate(&self.db, request.per_page);
        let total = paginator.num_items().await.map_err(repo_err)?;
        let number = request.resolve(total);

        let items = paginator
            .fetch_page(number - 1)
            .await
            .map_err(repo_err)?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(Page::new(items, number, total, request))
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        PostEntity::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .count(&self.db)
            .await
            .map_err(repo_err)
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::Created)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl FollowRepository for PostgresFollowRepository {
    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let edge: follow::ActiveModel = Follow::new(user_id, author_id).into();

        let inserted = FollowEntity::insert(edge)
            .on_conflict(
                OnConflict::columns([follow::Column::UserId, follow::Column::AuthorId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(repo_err)?;

        tracing::debug!(%user_id, %author_id, created = inserted > 0, "Follow requested");
        Ok(inserted > 0)
    }

    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let result = FollowEntity::delete_many()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .exec(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let found = FollowEntity::find()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .limit(1)
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(found.is_some())
    }

    async fn count_followers(&self, author_id: Uuid) -> Result<u64, RepoError> {
        FollowEntity::find()
            .filter(follow::Column::AuthorId.eq(author_id))
            .count(&self.db)
            .await
            .map_err(repo_err)
    }

    async fn count_following(&self, user_id: Uuid) -> Result<u64, RepoError> {
        FollowEntity::find()
            .filter(follow::Column::UserId.eq(user_id))
            .count(&self.db)
            .await
            .map_err(repo_err)
    }

    async fn count(&self) -> Result<u64, RepoError> {
        FollowEntity::find().count(&self.db).await.map_err(repo_err)
    }
}
