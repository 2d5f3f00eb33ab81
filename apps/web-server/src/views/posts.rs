//! Post listings, the post page and the post form.

use std::fmt::Write;

use uuid::Uuid;

use posty_core::domain::{Group, Page, Post, User};
use posty_shared::FormErrors;

use super::{escape, field_errors, layout, linebreaks, non_field_errors, post_card, post_list};
use crate::listing::{CommentView, PostCard};

pub fn index(viewer: Option<&User>, page: &Page<PostCard>) -> String {
    let content = format!(
        "<h1>Latest updates</h1>\n{}",
        post_list(page)
    );
    layout("Posty - latest updates", viewer, &content)
}

pub fn group(viewer: Option<&User>, group: &Group, page: &Page<PostCard>) -> String {
    let content = format!(
        r#"<h1>{title}</h1>
<p class="group-description">{description}</p>
{posts}"#,
        title = escape(&group.title),
        description = linebreaks(&group.description),
        posts = post_list(page),
    );
    layout(&group.title, viewer, &content)
}

pub fn follow(viewer: Option<&User>, page: &Page<PostCard>) -> String {
    let content = format!("<h1>Your feed</h1>\n{}", post_list(page));
    layout("Posty - feed", viewer, &content)
}

/// Everything the single-post page shows.
pub struct PostDetail<'a> {
    pub card: &'a PostCard,
    pub author_post_count: u64,
    pub comments: &'a [CommentView],
    pub can_edit: bool,
}

pub fn detail(viewer: Option<&User>, detail: &PostDetail<'_>) -> String {
    let card = detail.card;
    let author = escape(&card.author.username);

    let mut content = format!(
        r#"<aside class="author-card">
  <a href="/{author}/">{author}</a>
  <p>Posts: {count}</p>
</aside>
{post}"#,
        count = detail.author_post_count,
        post = post_card(card),
    );

    if detail.can_edit {
        let _ = write!(
            content,
            r#"<p><a href="/{author}/{id}/edit/">Edit</a></p>"#,
            id = card.post.id
        );
    }

    content.push_str(r#"<section class="comments"><h2>Comments</h2>"#);
    for view in detail.comments {
        let _ = write!(
            content,
            r#"<div class="comment"><a href="/{name}/">{name}</a> <small>{date}</small><p>{text}</p></div>"#,
            name = escape(&view.author.username),
            date = view.comment.created.format("%d %b %Y %H:%M"),
            text = linebreaks(&view.comment.text),
        );
    }
    if viewer.is_some() {
        let _ = write!(
            content,
            r#"<form method="post" action="/{author}/{id}/comment/">
  <label for="id_text">Your comment</label>
  <textarea name="text" id="id_text" required></textarea>
  <button type="submit">Send</button>
</form>"#,
            id = card.post.id
        );
    }
    content.push_str("</section>");

    layout(&card.post.excerpt(), viewer, &content)
}

/// State of the new/edit post form.
pub struct PostFormView<'a> {
    /// The post being edited; `None` for a new post.
    pub editing: Option<(&'a User, &'a Post)>,
    pub text: &'a str,
    pub group: Option<Uuid>,
    pub groups: &'a [Group],
    pub errors: &'a FormErrors,
}

pub fn form(viewer: Option<&User>, view: &PostFormView<'_>) -> String {
    let (heading, button, action) = match view.editing {
        Some((author, post)) => (
            "Edit post",
            "Save",
            format!("/{}/{}/edit/", escape(&author.username), post.id),
        ),
        None => ("New post", "Publish", "/new/".to_string()),
    };

    let mut options = String::from(r#"<option value="">---------</option>"#);
    for group in view.groups {
        let selected = if view.group == Some(group.id) {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            options,
            r#"<option value="{id}"{selected}>{title}</option>"#,
            id = group.id,
            title = escape(&group.title),
        );
    }

    let current_image = match view.editing.and_then(|(_, post)| post.image.as_deref()) {
        Some(image) => format!(
            r#"<p>Currently: <a href="/media/{path}">{path}</a>
  <input type="checkbox" name="image-clear" id="image-clear_id">
  <label for="image-clear_id">Clear</label></p>"#,
            path = escape(image)
        ),
        None => String::new(),
    };

    let content = format!(
        r#"<h1>{heading}</h1>
{non_field}
<form method="post" enctype="multipart/form-data" action="{action}">
  <label for="id_group">Group</label>
  <select name="group" id="id_group">{options}</select>
  {group_errors}
  <label for="id_text">Text</label>
  <textarea name="text" id="id_text" required>{text}</textarea>
  {text_errors}
  <label for="id_image">Image</label>
  {current_image}
  <input type="file" name="image" id="id_image" accept="image/*">
  {image_errors}
  <button type="submit">{button}</button>
</form>"#,
        non_field = non_field_errors(view.errors),
        group_errors = field_errors(view.errors, "group"),
        text = escape(view.text),
        text_errors = field_errors(view.errors, "text"),
        image_errors = field_errors(view.errors, "image"),
    );

    layout(heading, viewer, &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_marks_selected_group_and_shows_errors() {
        let group = Group::new("Cats".into(), "cats".into(), String::new()).unwrap();
        let mut errors = FormErrors::new();
        errors.add("image", "The submitted file is empty.");

        let html = form(
            None,
            &PostFormView {
                editing: None,
                text: "<b>hi</b>",
                group: Some(group.id),
                groups: std::slice::from_ref(&group),
                errors: &errors,
            },
        );

        assert!(html.contains(&format!(r#"<option value="{}" selected>Cats</option>"#, group.id)));
        assert!(html.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(html.contains("The submitted file is empty."));
        assert!(html.contains(r#"action="/new/""#));
    }

    #[test]
    fn edit_form_offers_image_clear() {
        let author = User::new("sarah".into(), "s@example.com".into(), "x".into());
        let post = Post::new(author.id, "text".into(), None)
            .with_image(Some("posts/a.png".into()));

        let html = form(
            Some(&author),
            &PostFormView {
                editing: Some((&author, &post)),
                text: &post.text,
                group: None,
                groups: &[],
                errors: &FormErrors::new(),
            },
        );

        assert!(html.contains(r#"name="image-clear""#));
        assert!(html.contains(&format!(r#"action="/sarah/{}/edit/""#, post.id)));
    }
}
