use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
    response::{IntoResponse, Redirect},
    Form, Json,
};
use serde::Deserialize;
use tower_cookies::{cookie::SameSite, Cookie, Cookies};

use crate::{
    client_server::{extractors::SESSION_COOKIE, AppState},
    shared::{HttpError, HttpResult},
};

#[derive(Debug, Deserialize)]
pub struct LoginInitForm {
    #[serde(default)]
    me: String,
}

pub async fn login_init(
    State(state): State<AppState>,
    Form(form): Form<LoginInitForm>,
) -> HttpResult<impl IntoResponse> {
    let me = form.me.trim();
    if me.is_empty() {
        return Err(HttpError::bad_request("me is required"));
    }

    let (_, redirect) = state
        .indieauth
        .init(me, &state.client.client_id, &state.client.redirect_uri)
        .await?;

    Ok(Redirect::to(redirect.as_str()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CallbackParams {
    state: String,
    code: String,
}

pub async fn login_callback_get(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(params): Query<CallbackParams>,
) -> HttpResult<impl IntoResponse> {
    login_callback(state, cookies, params).await
}

pub async fn login_callback_post(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(params): Form<CallbackParams>,
) -> HttpResult<impl IntoResponse> {
    login_callback(state, cookies, params).await
}

async fn login_callback(
    state: AppState,
    cookies: Cookies,
    params: CallbackParams,
) -> HttpResult<impl IntoResponse> {
    tracing::info!(state = %params.state, "Callback received");

    let session = state
        .indieauth
        .callback(
            &params.state,
            &params.code,
            &state.client.client_id,
            &state.client.redirect_uri,
        )
        .await?;

    let mut cookie = Cookie::new(SESSION_COOKIE, session.uid);
    cookie.set_path("/");
    // Prevent javascript from accessing the cookie.
    cookie.set_http_only(true);
    // Not sent on cross-site subrequests or form posts.
    cookie.set_same_site(SameSite::Lax);
    cookies.add(cookie);

    Ok(Redirect::to("/composer"))
}

/// Check a bearer token against the configured token endpoint.
pub async fn verify_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> HttpResult<impl IntoResponse> {
    let Some(bearer) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
        return Err(HttpError::unauthorized());
    };

    let token = state.indieauth.verify_access_token(bearer).await?;
    if !token.is_valid() {
        tracing::info!(error = %token.error, status = token.status_code, "Invalid access token");
        return Err(HttpError::unauthorized());
    }

    Ok(Json(token))
}
