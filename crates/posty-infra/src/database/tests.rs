use chrono::Utc;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use uuid::Uuid;

use posty_core::domain::{PageRequest, Post, PostFilter, User};
use posty_core::error::RepoError;
use posty_core::ports::{BaseRepository, FollowRepository, PostRepository, UserRepository};

use crate::database::entity::{post, user};
use crate::database::postgres_repo::{
    PostgresFollowRepository, PostgresPostRepository, PostgresUserRepository,
};

/// SQL of every statement the mock connection has seen, in order.
fn statements(db: DatabaseConnection) -> Vec<String> {
    db.into_transaction_log()
        .iter()
        .flat_map(|transaction| transaction.statements().iter().map(|s| s.sql.clone()))
        .collect()
}

fn post_model(author_id: Uuid, text: &str) -> post::Model {
    post::Model {
        id: Uuid::new_v4(),
        text: text.to_owned(),
        pub_date: Utc::now().into(),
        author_id,
        group_id: None,
        image: None,
    }
}

#[tokio::test]
async fn find_post_by_id() {
    let author_id = Uuid::new_v4();
    let model = post_model(author_id, "Тестовый пост");
    let post_id = model.id;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    let post = result.unwrap();
    assert_eq!(post.id, post_id);
    assert_eq!(post.text, "Тестовый пост");
    assert_eq!(post.author_id, author_id);
    assert!(post.group_id.is_none());
}

#[tokio::test]
async fn find_user_by_username() {
    let now = Utc::now();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user::Model {
            id: Uuid::new_v4(),
            username: "sarah".to_owned(),
            email: "sarah@example.com".to_owned(),
            password_hash: "hash".to_owned(),
            created_at: now.into(),
            updated_at: now.into(),
        }]])
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();

    let repo = PostgresUserRepository::new(db);

    let found: Option<User> = repo.find_by_username("sarah").await.unwrap();
    assert_eq!(found.unwrap().username, "sarah");

    let missing = repo.find_by_username("nobody").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn find_by_ids_skips_query_for_empty_input() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let repo = PostgresUserRepository::new(db);

    assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_missing_row_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let result = BaseRepository::<Post, Uuid>::delete(&repo, Uuid::new_v4()).await;

    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn follow_reports_whether_edge_was_created() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ])
        .into_connection();

    let repo = PostgresFollowRepository::new(db);
    let (user_id, author_id) = (Uuid::new_v4(), Uuid::new_v4());

    assert!(repo.follow(user_id, author_id).await.unwrap());
    // conflict on (user_id, author_id) inserts nothing
    assert!(!repo.follow(user_id, author_id).await.unwrap());

    let log = statements(repo.db);
    assert_eq!(log.len(), 2);
    assert!(log[0].starts_with(r#"INSERT INTO "follows""#), "{}", log[0]);
    assert!(
        log[0].ends_with(r#"ON CONFLICT ("user_id", "author_id") DO NOTHING"#),
        "{}",
        log[0]
    );
}

#[tokio::test]
async fn unfollow_reports_removed_edge() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();

    let repo = PostgresFollowRepository::new(db);
    assert!(repo.unfollow(Uuid::new_v4(), Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn feed_page_resolves_against_count() {
    let follower = Uuid::new_v4();
    let author = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![std::collections::BTreeMap::from([(
            "num_items".to_owned(),
            sea_orm::Value::BigInt(Some(1)),
        )])]])
        .append_query_results([vec![post_model(author, "followed")]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let page = repo
        .find_page(PostFilter::FollowedBy(follower), &PageRequest::first(10))
        .await
        .unwrap();

    assert_eq!(page.number, 1);
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items[0].author_id, author);
    assert!(!page.has_next());

    // both the count and the page query select through the follow edges
    let log = repo.db.into_transaction_log();
    assert_eq!(log.len(), 2);
    for transaction in &log {
        let statement = &transaction.statements()[0];
        assert!(
            statement
                .sql
                .contains(r#""posts"."author_id" IN (SELECT "author_id" FROM "follows" WHERE"#),
            "{}",
            statement.sql
        );
        assert!(statement.sql.contains(r#""user_id" = $1"#), "{}", statement.sql);
        let values = format!("{:?}", statement.values);
        assert!(values.contains(&follower.to_string()), "{}", values);
    }
}
