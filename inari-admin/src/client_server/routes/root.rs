use axum::response::{Html, IntoResponse};

pub async fn handler() -> impl IntoResponse {
    format!(
        "Inari admin server v{}\nLog in at /login",
        env!("CARGO_PKG_VERSION")
    )
}

pub async fn login_form() -> impl IntoResponse {
    Html(
        r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Log in</title></head>
<body>
<form method="post" action="/login-init">
<label for="me">Your website</label>
<input type="url" id="me" name="me" placeholder="https://example.com/" required>
<button type="submit">Log in</button>
</form>
</body>
</html>
"#,
    )
}
