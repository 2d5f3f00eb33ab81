//! Server-rendered HTML.
//!
//! Pages are plain `format!` templates around a shared [`layout`]. Every
//! user-supplied string goes through [`escape`] before it is interpolated.

pub mod auth;
pub mod errors;
pub mod posts;
pub mod profiles;

use std::fmt::Write;

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;

use posty_core::domain::{Page, User};
use posty_shared::FormErrors;

use crate::listing::PostCard;

/// Wrap a rendered page in a response.
pub fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(body)
}

/// HTML-escape text for element content and quoted attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape and keep line breaks.
pub fn linebreaks(raw: &str) -> String {
    escape(raw).replace('\n', "<br>")
}

pub fn layout(title: &str, viewer: Option<&User>, content: &str) -> String {
    let nav = match viewer {
        Some(user) => format!(
            r#"<a href="/new/">New post</a>
      <a href="/follow/">Feed</a>
      <a href="/{name}/">{name}</a>
      <a href="/auth/logout/">Log out</a>"#,
            name = escape(&user.username)
        ),
        None => r#"<a href="/auth/login/">Log in</a>
      <a href="/auth/signup/">Sign up</a>"#
            .to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
</head>
<body>
  <header>
    <nav>
      <a href="/">Posty</a>
      {nav}
    </nav>
  </header>
  <main>
{content}
  </main>
  <footer>&copy; Posty</footer>
</body>
</html>
"#,
        title = escape(title),
    )
}

/// Previous/next links and the page counter. Empty when there is one page.
pub fn paginator<T>(page: &Page<T>) -> String {
    if page.num_pages <= 1 {
        return String::new();
    }

    let mut out = String::from(r#"<nav class="pagination">"#);
    if let Some(prev) = page.previous_number() {
        let _ = write!(out, r#"<a href="?page=1">&laquo; first</a> "#);
        let _ = write!(out, r#"<a href="?page={prev}">previous</a> "#);
    }
    let _ = write!(
        out,
        r#"<span class="current">Page {} of {}</span>"#,
        page.number, page.num_pages
    );
    if let Some(next) = page.next_number() {
        let _ = write!(out, r#" <a href="?page={next}">next</a>"#);
        let _ = write!(out, r#" <a href="?page={}">last &raquo;</a>"#, page.num_pages);
    }
    out.push_str("</nav>");
    out
}

/// One post as it appears in a listing.
pub fn post_card(card: &PostCard) -> String {
    let author = escape(&card.author.username);
    let mut out = String::from(r#"<article class="post">"#);

    let _ = write!(
        out,
        r#"<p class="meta"><a href="/{author}/">{author}</a> &middot; {date}"#,
        date = card.post.pub_date.format("%d %b %Y %H:%M"),
    );
    if let Some(group) = &card.group {
        let _ = write!(
            out,
            r#" &middot; <a href="/group/{slug}/">{title}</a>"#,
            slug = escape(&group.slug),
            title = escape(&group.title),
        );
    }
    out.push_str("</p>");

    if let Some(image) = &card.post.image {
        let _ = write!(
            out,
            r#"<img class="post-image" src="/media/{}" alt="">"#,
            escape(image)
        );
    }
    let _ = write!(
        out,
        r#"<p>{text}</p><a href="/{author}/{id}/">Open post</a></article>"#,
        text = linebreaks(&card.post.text),
        id = card.post.id,
    );
    out
}

/// Cards for a whole page, or a placeholder when it is empty.
pub fn post_list(page: &Page<PostCard>) -> String {
    if page.items.is_empty() {
        return r#"<p class="empty">No posts yet.</p>"#.to_string();
    }
    let mut out = String::new();
    for card in &page.items {
        out.push_str(&post_card(card));
        out.push('\n');
    }
    out.push_str(&paginator(page));
    out
}

/// `<ul>` of a field's errors, empty if the field is valid.
pub fn field_errors(errors: &FormErrors, field: &str) -> String {
    error_list(errors.field(field))
}

pub fn non_field_errors(errors: &FormErrors) -> String {
    error_list(errors.non_field())
}

fn error_list(messages: &[String]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let mut out = String::from(r#"<ul class="errorlist">"#);
    for message in messages {
        let _ = write!(out, "<li>{}</li>", escape(message));
    }
    out.push_str("</ul>");
    out
}
