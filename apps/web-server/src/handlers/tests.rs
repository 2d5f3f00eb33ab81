//! End-to-end tests against the full route table with in-memory adapters.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use actix_http::Request;
use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use uuid::Uuid;

use posty_core::domain::{Group, Page, PageRequest, Post, PostFilter, User};
use posty_core::error::RepoError;
use posty_core::ports::{AuthError, BaseRepository, PasswordService, PostRepository};
use posty_infra::cache::InMemoryCache;
use posty_infra::database::InMemoryDatabase;
use posty_infra::media::InMemoryMediaStorage;
use posty_infra::rate_limit::RateLimitConfig;
use posty_infra::InMemoryRateLimiter;

use super::{configure_routes, not_found};
use crate::config::SiteSettings;
use crate::middleware::error::error_pages;
use crate::state::{AppState, Repositories};

const PASSWORD: &str = "correct-horse";
const BOUNDARY: &str = "posty-test-boundary";

/// Stores passwords as-is so tests do not pay for Argon2.
struct PlainPasswords;

impl PasswordService for PlainPasswords {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain${}", password))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        Ok(hash == format!("plain${}", password))
    }
}

fn test_state() -> AppState {
    AppState::in_memory(Arc::new(PlainPasswords), SiteSettings::default())
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .wrap(error_pages())
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                        .cookie_secure(false)
                        .build(),
                )
                .app_data(web::Data::new($state.clone()))
                .configure(configure_routes)
                .default_service(web::to(not_found)),
        )
        .await
    };
}

async fn create_user(state: &AppState, username: &str) -> User {
    state
        .users
        .insert(User::new(
            username.to_string(),
            format!("{}@example.com", username),
            format!("plain${}", PASSWORD),
        ))
        .await
        .unwrap()
}

async fn create_group(state: &AppState, slug: &str) -> Group {
    let group = Group::new(format!("Group {}", slug), slug.to_string(), String::new()).unwrap();
    state.groups.insert(group).await.unwrap()
}

async fn create_post(state: &AppState, author: &User, text: &str, group: Option<&Group>) -> Post {
    state
        .posts
        .insert(Post::new(author.id, text.to_string(), group.map(|g| g.id)))
        .await
        .unwrap()
}

async fn total_posts(state: &AppState, filter: PostFilter) -> u64 {
    state
        .posts
        .find_page(filter, &PageRequest::first(10))
        .await
        .unwrap()
        .total_items
}

async fn login<S, B>(app: &S, username: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([("username", username), ("password", PASSWORD)])
        .to_request();
    let res = test::call_service(app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND, "login as {} failed", username);
    res.response()
        .cookies()
        .find(|c| c.name() == "id")
        .expect("session cookie")
        .into_owned()
}

async fn get_page<S, B>(app: &S, uri: &str, cookie: Option<&Cookie<'static>>) -> (StatusCode, String)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let mut req = test::TestRequest::get().uri(uri);
    if let Some(cookie) = cookie {
        req = req.cookie(cookie.clone());
    }
    let res = test::call_service(app, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn location<B>(res: &ServiceResponse<B>) -> String {
    res.headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .unwrap()
        .to_string()
}

fn png_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(2, 2))
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .unwrap();
    bytes
}

fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, cookie: Option<&Cookie<'static>>, body: Vec<u8>) -> Request {
    let mut req = test::TestRequest::post().uri(uri).insert_header((
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    ));
    if let Some(cookie) = cookie {
        req = req.cookie(cookie.clone());
    }
    req.set_payload(body).to_request()
}

#[actix_web::test]
async fn anonymous_post_creation_redirects_to_login() {
    let state = test_state();
    let app = init_app!(state);

    let res = test::call_service(&app, test::TestRequest::get().uri("/new/").to_request()).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/auth/login/?next=%2Fnew%2F");

    let body = multipart_body(&[("text", "sneaky")], None);
    let res = test::call_service(&app, multipart_request("/new/", None, body)).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/auth/login/?next=%2Fnew%2F");
    assert_eq!(total_posts(&state, PostFilter::All).await, 0);
}

#[actix_web::test]
async fn created_post_appears_in_every_listing() {
    let state = test_state();
    let author = create_user(&state, "leo").await;
    let group = create_group(&state, "cats").await;
    let app = init_app!(state);
    let cookie = login(&app, "leo").await;

    let group_id = group.id.to_string();
    let body = multipart_body(&[("text", "Fresh post"), ("group", &group_id)], None);
    let res = test::call_service(&app, multipart_request("/new/", Some(&cookie), body)).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/");

    let page = state
        .posts
        .find_page(PostFilter::Author(author.id), &PageRequest::first(10))
        .await
        .unwrap();
    assert_eq!(page.total_items, 1);
    let post = &page.items[0];
    assert_eq!(post.group_id, Some(group.id));

    state.cache.clear().await.unwrap();
    for uri in ["/", "/group/cats/", "/leo/"] {
        let (status, body) = get_page(&app, uri, None).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert!(body.contains("Fresh post"), "{} does not list the post", uri);
    }

    let (status, body) = get_page(&app, &format!("/leo/{}/", post.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Fresh post"));
    assert!(body.contains("Posts: 1"));
}

#[actix_web::test]
async fn index_is_served_from_cache_until_cleared() {
    let state = test_state();
    let author = create_user(&state, "leo").await;
    let app = init_app!(state);

    let (_, first) = get_page(&app, "/", None).await;
    assert!(first.contains("No posts yet."));

    create_post(&state, &author, "Late arrival", None).await;
    let (_, cached) = get_page(&app, "/", None).await;
    assert_eq!(cached, first);

    state.cache.clear().await.unwrap();
    let (_, fresh) = get_page(&app, "/", None).await;
    assert!(fresh.contains("Late arrival"));
}

#[actix_web::test]
async fn following_twice_then_unfollowing_restores_count() {
    let state = test_state();
    let reader = create_user(&state, "reader").await;
    let author = create_user(&state, "leo").await;
    let app = init_app!(state);
    let cookie = login(&app, "reader").await;

    let before = state.follows.count().await.unwrap();
    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri("/leo/follow/")
            .cookie(cookie.clone())
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), "/leo/");
    }
    assert_eq!(state.follows.count().await.unwrap(), before + 1);
    assert!(state.follows.is_following(reader.id, author.id).await.unwrap());

    let (_, profile) = get_page(&app, "/leo/", Some(&cookie)).await;
    assert!(profile.contains("Followers: 1"));
    assert!(profile.contains(r#"href="/leo/unfollow/""#));

    let req = test::TestRequest::get()
        .uri("/leo/unfollow/")
        .cookie(cookie.clone())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(state.follows.count().await.unwrap(), before);
}

#[actix_web::test]
async fn self_follow_is_ignored_and_unknown_author_is_404() {
    let state = test_state();
    create_user(&state, "leo").await;
    let app = init_app!(state);
    let cookie = login(&app, "leo").await;

    let req = test::TestRequest::get()
        .uri("/leo/follow/")
        .cookie(cookie.clone())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(state.follows.count().await.unwrap(), 0);

    let (status, _) = get_page(&app, "/ghost/follow/", Some(&cookie)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn feed_only_contains_followed_authors() {
    let state = test_state();
    let reader = create_user(&state, "reader").await;
    let followed = create_user(&state, "leo").await;
    let other = create_user(&state, "mia").await;
    create_post(&state, &followed, "From the followed author", None).await;
    create_post(&state, &other, "From a stranger", None).await;
    state.follows.follow(reader.id, followed.id).await.unwrap();

    let app = init_app!(state);
    let cookie = login(&app, "reader").await;

    let (status, feed) = get_page(&app, "/follow/", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(feed.contains("From the followed author"));
    assert!(!feed.contains("From a stranger"));

    let other_cookie = login(&app, "mia").await;
    let (_, empty_feed) = get_page(&app, "/follow/", Some(&other_cookie)).await;
    assert!(empty_feed.contains("No posts yet."));
}

#[actix_web::test]
async fn editing_group_moves_post_between_listings() {
    let state = test_state();
    let author = create_user(&state, "leo").await;
    let old_group = create_group(&state, "old").await;
    let new_group = create_group(&state, "new-home").await;
    let post = create_post(&state, &author, "Wandering post", Some(&old_group)).await;

    let app = init_app!(state);
    let cookie = login(&app, "leo").await;

    let new_group_id = new_group.id.to_string();
    let body = multipart_body(
        &[("text", "Wandering post, edited"), ("group", &new_group_id)],
        None,
    );
    let uri = format!("/leo/{}/edit/", post.id);
    let res = test::call_service(&app, multipart_request(&uri, Some(&cookie), body)).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), format!("/leo/{}/", post.id));

    assert_eq!(total_posts(&state, PostFilter::Group(old_group.id)).await, 0);
    assert_eq!(total_posts(&state, PostFilter::Group(new_group.id)).await, 1);

    let (_, old_page) = get_page(&app, "/group/old/", None).await;
    assert!(!old_page.contains("Wandering post"));
    let (_, new_page) = get_page(&app, "/group/new-home/", None).await;
    assert!(new_page.contains("Wandering post, edited"));
}

#[actix_web::test]
async fn non_author_edit_redirects_to_post() {
    let state = test_state();
    let author = create_user(&state, "leo").await;
    create_user(&state, "mia").await;
    let post = create_post(&state, &author, "Mine", None).await;

    let app = init_app!(state);
    let cookie = login(&app, "mia").await;

    let req = test::TestRequest::get()
        .uri(&format!("/leo/{}/edit/", post.id))
        .cookie(cookie.clone())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), format!("/leo/{}/", post.id));
}

#[actix_web::test]
async fn non_image_upload_is_rejected_and_nothing_is_created() {
    let state = test_state();
    create_user(&state, "leo").await;
    let app = init_app!(state);
    let cookie = login(&app, "leo").await;

    let body = multipart_body(
        &[("text", "With attachment")],
        Some(("notes.txt", b"just some text")),
    );
    let res = test::call_service(&app, multipart_request("/new/", Some(&cookie), body)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page = String::from_utf8(test::read_body(res).await.to_vec()).unwrap();
    assert!(page.contains("File extension “txt” is not allowed."));
    assert!(page.contains("With attachment"));

    let body = multipart_body(
        &[("text", "With attachment")],
        Some(("fake.png", b"not really a png")),
    );
    let res = test::call_service(&app, multipart_request("/new/", Some(&cookie), body)).await;
    let page = String::from_utf8(test::read_body(res).await.to_vec()).unwrap();
    assert!(page.contains("Upload a valid image."));

    assert_eq!(total_posts(&state, PostFilter::All).await, 0);
}

#[actix_web::test]
async fn empty_text_and_unknown_group_are_reported_inline() {
    let state = test_state();
    create_user(&state, "leo").await;
    let app = init_app!(state);
    let cookie = login(&app, "leo").await;

    let missing_group = uuid::Uuid::new_v4().to_string();
    let body = multipart_body(&[("text", "   "), ("group", &missing_group)], None);
    let res = test::call_service(&app, multipart_request("/new/", Some(&cookie), body)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page = String::from_utf8(test::read_body(res).await.to_vec()).unwrap();
    assert!(page.contains("This field is required."));
    assert!(page.contains("Select a valid choice."));
    assert_eq!(total_posts(&state, PostFilter::All).await, 0);
}

#[actix_web::test]
async fn blank_text_with_existing_group_has_no_group_error() {
    let state = test_state();
    create_user(&state, "leo").await;
    let group = create_group(&state, "cats").await;
    let app = init_app!(state);
    let cookie = login(&app, "leo").await;

    let group_id = group.id.to_string();
    let body = multipart_body(&[("text", ""), ("group", &group_id)], None);
    let res = test::call_service(&app, multipart_request("/new/", Some(&cookie), body)).await;
    let page = String::from_utf8(test::read_body(res).await.to_vec()).unwrap();
    assert!(page.contains("This field is required."));
    assert!(!page.contains("Select a valid choice."));
    assert!(page.contains(&format!(r#"<option value="{}" selected>"#, group.id)));
}

#[actix_web::test]
async fn overlong_text_is_reported_instead_of_cut() {
    let state = test_state();
    create_user(&state, "leo").await;
    let app = init_app!(state);
    let cookie = login(&app, "leo").await;

    let text = "a".repeat(70_000);
    let body = multipart_body(&[("text", &text)], None);
    let res = test::call_service(&app, multipart_request("/new/", Some(&cookie), body)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page = String::from_utf8(test::read_body(res).await.to_vec()).unwrap();
    assert!(page.contains("Ensure this value has at most 65536 bytes."));
    assert_eq!(total_posts(&state, PostFilter::All).await, 0);

    // exactly at the limit is fine
    let text = "a".repeat(64 * 1024);
    let body = multipart_body(&[("text", &text)], None);
    let res = test::call_service(&app, multipart_request("/new/", Some(&cookie), body)).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(total_posts(&state, PostFilter::All).await, 1);
}

#[actix_web::test]
async fn upload_together_with_clear_is_rejected() {
    let state = test_state();
    let author = create_user(&state, "leo").await;
    let post = Post::new(author.id, "Old picture".into(), None)
        .with_image(Some("posts/old.png".into()));
    let post = state.posts.insert(post).await.unwrap();
    let app = init_app!(state);
    let cookie = login(&app, "leo").await;

    let png = png_bytes();
    let uri = format!("/leo/{}/edit/", post.id);
    let body = multipart_body(
        &[("text", "New picture"), ("image-clear", "on")],
        Some(("new.png", &png)),
    );
    let res = test::call_service(&app, multipart_request(&uri, Some(&cookie), body)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page = String::from_utf8(test::read_body(res).await.to_vec()).unwrap();
    assert!(page.contains("Please either submit a file or check the clear checkbox, not both."));

    let unchanged = state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(unchanged.text, "Old picture");
    assert_eq!(unchanged.image.as_deref(), Some("posts/old.png"));
}

/// Post store that reads fine but refuses every write.
struct ReadOnlyPosts(Arc<InMemoryDatabase>);

#[async_trait]
impl BaseRepository<Post, Uuid> for ReadOnlyPosts {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        BaseRepository::<Post, Uuid>::find_by_id(self.0.as_ref(), id).await
    }

    async fn insert(&self, _entity: Post) -> Result<Post, RepoError> {
        Err(RepoError::Connection("read only".into()))
    }

    async fn update(&self, _entity: Post) -> Result<Post, RepoError> {
        Err(RepoError::Connection("read only".into()))
    }

    async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
        Err(RepoError::Connection("read only".into()))
    }
}

#[async_trait]
impl PostRepository for ReadOnlyPosts {
    async fn find_page(
        &self,
        filter: PostFilter,
        request: &PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        self.0.find_page(filter, request).await
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        self.0.count_by_author(author_id).await
    }
}

#[actix_web::test]
async fn failed_save_removes_the_stored_image() {
    let db = Arc::new(InMemoryDatabase::new());
    let media = Arc::new(InMemoryMediaStorage::new());
    let mut repos = Repositories::in_memory(db.clone());
    repos.posts = Arc::new(ReadOnlyPosts(db.clone()));
    let state = AppState::from_parts(
        repos,
        Arc::new(InMemoryCache::new()),
        media.clone(),
        Arc::new(PlainPasswords),
        Arc::new(InMemoryRateLimiter::new(RateLimitConfig::default())),
        SiteSettings::default(),
    );
    let author = create_user(&state, "leo").await;
    let post = BaseRepository::<Post, Uuid>::insert(
        db.as_ref(),
        Post::new(author.id, "Kept".into(), None),
    )
    .await
    .unwrap();
    let app = init_app!(state);
    let cookie = login(&app, "leo").await;

    let png = png_bytes();
    let body = multipart_body(&[("text", "Picture post")], Some(("a.png", &png)));
    let res = test::call_service(&app, multipart_request("/new/", Some(&cookie), body)).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(media.is_empty().await);

    let uri = format!("/leo/{}/edit/", post.id);
    let body = multipart_body(&[("text", "Edited")], Some(("b.png", &png)));
    let res = test::call_service(&app, multipart_request(&uri, Some(&cookie), body)).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(media.is_empty().await);
}

#[actix_web::test]
async fn image_is_stored_served_kept_and_cleared() {
    let state = test_state();
    let author = create_user(&state, "leo").await;
    let app = init_app!(state);
    let cookie = login(&app, "leo").await;

    let png = png_bytes();
    let body = multipart_body(&[("text", "Picture post")], Some(("Photo.PNG", &png)));
    let res = test::call_service(&app, multipart_request("/new/", Some(&cookie), body)).await;
    assert_eq!(res.status(), StatusCode::FOUND);

    let page = state
        .posts
        .find_page(PostFilter::Author(author.id), &PageRequest::first(10))
        .await
        .unwrap();
    let post = page.items[0].clone();
    let image = post.image.clone().expect("stored image");
    assert!(image.ends_with(".png"));

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/media/{}", image))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
    assert_eq!(test::read_body(res).await.to_vec(), png);

    let (_, detail) = get_page(&app, &format!("/leo/{}/", post.id), None).await;
    assert!(detail.contains(&format!(r#"src="/media/{}""#, image)));

    // an edit without a new file keeps the image
    let uri = format!("/leo/{}/edit/", post.id);
    let body = multipart_body(&[("text", "Picture post v2")], None);
    test::call_service(&app, multipart_request(&uri, Some(&cookie), body)).await;
    let kept = state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(kept.image.as_deref(), Some(image.as_str()));

    let body = multipart_body(&[("text", "Picture post v3"), ("image-clear", "on")], None);
    test::call_service(&app, multipart_request(&uri, Some(&cookie), body)).await;
    let cleared = state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(cleared.image, None);

    let (status, _) = get_page(&app, &format!("/media/{}", image), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn unknown_routes_render_custom_404() {
    let state = test_state();
    let author = create_user(&state, "leo").await;
    create_user(&state, "mia").await;
    let post = create_post(&state, &author, "Somewhere", None).await;
    let app = init_app!(state);

    let (status, body) = get_page(&app, "/no/such/page/here/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Page not found"));
    assert!(body.contains("/no/such/page/here/"));

    for uri in [
        "/ghost/".to_string(),
        "/group/missing/".to_string(),
        "/leo/not-a-uuid/".to_string(),
        format!("/mia/{}/", post.id),
    ] {
        let (status, body) = get_page(&app, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert!(body.contains("Page not found"), "{}", uri);
    }
}

#[actix_web::test]
async fn comments_need_login_and_an_existing_post() {
    let state = test_state();
    let author = create_user(&state, "leo").await;
    create_user(&state, "mia").await;
    let post = create_post(&state, &author, "Discuss", None).await;
    let app = init_app!(state);
    let uri = format!("/leo/{}/comment/", post.id);

    let req = test::TestRequest::post()
        .uri(&uri)
        .set_form([("text", "anonymous words")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert!(location(&res).starts_with("/auth/login/?next="));

    let cookie = login(&app, "mia").await;
    let req = test::TestRequest::post()
        .uri(&uri)
        .cookie(cookie.clone())
        .set_form([("text", "Nice one")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), format!("/leo/{}/", post.id));

    // blank comments are dropped but still redirect
    let req = test::TestRequest::post()
        .uri(&uri)
        .cookie(cookie.clone())
        .set_form([("text", "   ")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);

    let comments = state.comments.list_for_post(post.id).await.unwrap();
    assert_eq!(comments.len(), 1);

    let (_, detail) = get_page(&app, &format!("/leo/{}/", post.id), None).await;
    assert!(detail.contains("Nice one"));
    assert!(!detail.contains("anonymous words"));

    let req = test::TestRequest::post()
        .uri(&format!("/leo/{}/comment/", uuid::Uuid::new_v4()))
        .cookie(cookie)
        .set_form([("text", "Into the void")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn signup_then_login_honours_next() {
    let state = test_state();
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form([
            ("username", "newbie"),
            ("email", "newbie@example.com"),
            ("password1", PASSWORD),
            ("password2", PASSWORD),
        ])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/auth/login/");

    let user = state.users.find_by_username("newbie").await.unwrap().unwrap();
    assert_eq!(user.password_hash, format!("plain${}", PASSWORD));

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form([
            ("username", "newbie"),
            ("email", "other@example.com"),
            ("password1", PASSWORD),
            ("password2", PASSWORD),
        ])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page = String::from_utf8(test::read_body(res).await.to_vec()).unwrap();
    assert!(page.contains("A user with that username already exists."));

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([("username", "newbie"), ("password", "wrong-password")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page = String::from_utf8(test::read_body(res).await.to_vec()).unwrap();
    assert!(page.contains("Please enter a correct username and password."));

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([
            ("username", "newbie"),
            ("password", PASSWORD),
            ("next", "/follow/"),
        ])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/follow/");

    let cookie = res
        .response()
        .cookies()
        .find(|c| c.name() == "id")
        .unwrap()
        .into_owned();
    let (status, _) = get_page(&app, "/follow/", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn logout_ends_the_session() {
    let state = test_state();
    create_user(&state, "leo").await;
    let app = init_app!(state);
    let cookie = login(&app, "leo").await;

    let req = test::TestRequest::get()
        .uri("/auth/logout/")
        .cookie(cookie)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/");

    // the purge sends back an expired cookie
    let cleared = res
        .response()
        .cookies()
        .find(|c| c.name() == "id")
        .unwrap()
        .into_owned();
    let (_, index) = get_page(&app, "/", Some(&cleared)).await;
    assert!(index.contains("/auth/login/"));
}

#[actix_web::test]
async fn login_attempts_are_throttled() {
    let state = AppState::from_parts(
        Repositories::in_memory(Arc::new(InMemoryDatabase::new())),
        Arc::new(InMemoryCache::new()),
        Arc::new(InMemoryMediaStorage::new()),
        Arc::new(PlainPasswords),
        Arc::new(InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 2,
            window: Duration::from_secs(60),
        })),
        SiteSettings::default(),
    );
    let app = init_app!(state);

    let attempt = || {
        test::TestRequest::post()
            .uri("/auth/login/")
            .set_form([("username", "nobody"), ("password", "guess")])
            .to_request()
    };
    for _ in 0..2 {
        let res = test::call_service(&app, attempt()).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
    let res = test::call_service(&app, attempt()).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().contains_key(header::RETRY_AFTER));
}

#[actix_web::test]
async fn health_reports_ok() {
    let state = test_state();
    let app = init_app!(state);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/health").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "ok");
}
