//! Login and signup forms.

use posty_shared::FormErrors;

use super::{escape, field_errors, layout, non_field_errors};

pub fn login(username: &str, next: Option<&str>, errors: &FormErrors) -> String {
    let next_input = match next {
        Some(next) => format!(
            r#"<input type="hidden" name="next" value="{}">"#,
            escape(next)
        ),
        None => String::new(),
    };

    let content = format!(
        r#"<h1>Log in</h1>
{non_field}
<form method="post" action="/auth/login/">
  {next_input}
  <label for="id_username">Username</label>
  <input type="text" name="username" id="id_username" value="{username}" required>
  {username_errors}
  <label for="id_password">Password</label>
  <input type="password" name="password" id="id_password" required>
  {password_errors}
  <button type="submit">Log in</button>
</form>
<p>No account yet? <a href="/auth/signup/">Sign up</a></p>"#,
        non_field = non_field_errors(errors),
        username = escape(username),
        username_errors = field_errors(errors, "username"),
        password_errors = field_errors(errors, "password"),
    );
    layout("Log in", None, &content)
}

pub fn signup(username: &str, email: &str, errors: &FormErrors) -> String {
    let content = format!(
        r#"<h1>Sign up</h1>
{non_field}
<form method="post" action="/auth/signup/">
  <label for="id_username">Username</label>
  <input type="text" name="username" id="id_username" value="{username}" maxlength="150" required>
  {username_errors}
  <label for="id_email">Email</label>
  <input type="email" name="email" id="id_email" value="{email}">
  {email_errors}
  <label for="id_password1">Password</label>
  <input type="password" name="password1" id="id_password1" required>
  {password1_errors}
  <label for="id_password2">Password confirmation</label>
  <input type="password" name="password2" id="id_password2" required>
  {password2_errors}
  <button type="submit">Sign up</button>
</form>"#,
        non_field = non_field_errors(errors),
        username = escape(username),
        username_errors = field_errors(errors, "username"),
        email = escape(email),
        email_errors = field_errors(errors, "email"),
        password1_errors = field_errors(errors, "password1"),
        password2_errors = field_errors(errors, "password2"),
    );
    layout("Sign up", None, &content)
}
