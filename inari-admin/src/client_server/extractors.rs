use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use inari_common::SessionId;
use tower_cookies::Cookies;

/// Name of the cookie holding the session id.
pub const SESSION_COOKIE: &str = "sessionid";

/// The session id from the `sessionid` cookie.
///
/// Without a usable cookie the request is redirected to `/login`.
#[derive(Debug, Clone)]
pub struct SessionCookie(pub SessionId);

impl<S> FromRequestParts<S> for SessionCookie
where
    S: Sync + Send,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let Some(cookie) = cookies.get(SESSION_COOKIE) else {
            tracing::info!("Redirecting, no sessionid cookie");
            return Err(Redirect::to("/login").into_response());
        };

        match SessionId::new(cookie.value()) {
            Ok(id) => Ok(SessionCookie(id)),
            Err(error) => {
                tracing::info!(?error, "Redirecting, invalid sessionid cookie");
                Err(Redirect::to("/login").into_response())
            }
        }
    }
}
