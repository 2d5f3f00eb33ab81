//! Error pages.

use super::{escape, layout};

pub fn not_found(path: &str) -> String {
    let content = format!(
        r#"<h1>Page not found</h1>
<p>The page <code>{}</code> does not exist.</p>
<p><a href="/">Back to the main page</a></p>"#,
        escape(path)
    );
    layout("Page not found", None, &content)
}

pub fn server_error() -> String {
    layout(
        "Server error",
        None,
        r#"<h1>Server error</h1>
<p>Something went wrong on our side. Please try again later.</p>"#,
    )
}

pub fn bad_request(detail: &str) -> String {
    let content = format!(
        "<h1>Bad request</h1>\n<p>{}</p>",
        escape(detail)
    );
    layout("Bad request", None, &content)
}

pub fn too_many_requests(retry_after_secs: u64) -> String {
    let content = format!(
        "<h1>Too many attempts</h1>\n<p>Try again in {} seconds.</p>",
        retry_after_secs
    );
    layout("Too many attempts", None, &content)
}
