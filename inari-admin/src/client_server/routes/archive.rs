use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::{
    archive::MediaSelection,
    client_server::{extractors::SessionCookie, AppState},
    shared::HttpResult,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GalleryQuery {
    url: String,
    after: String,
    year: String,
    month: String,
}

/// One media item when `url` is given, otherwise a page of the media archive.
pub async fn gallery(
    State(state): State<AppState>,
    SessionCookie(id): SessionCookie,
    Query(query): Query<GalleryQuery>,
) -> HttpResult<Response> {
    let session = state.session_store.fetch_by_id(&id).await?;

    if !query.url.is_empty() {
        let item = state.archive.media_item(&session, &query.url).await?;
        return Ok(Json(item).into_response());
    }

    let page = state
        .archive
        .list_media(
            &session,
            MediaSelection {
                after: query.after,
                year: query.year,
                month: query.month,
            },
        )
        .await;
    Ok(Json(page).into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostsQuery {
    after: String,
}

pub async fn query_posts(
    State(state): State<AppState>,
    SessionCookie(id): SessionCookie,
    Query(query): Query<PostsQuery>,
) -> HttpResult<impl IntoResponse> {
    let session = state.session_store.fetch_by_id(&id).await?;
    let after = Some(query.after.as_str()).filter(|after| !after.is_empty());

    Ok(Json(state.archive.query_posts(&session, after).await))
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;
    use httpmock::prelude::*;
    use inari_common::UserSession;
    use tower_cookies::Cookie;

    use crate::{client_server::create_app, AppContext};

    async fn logged_in(remote: &MockServer) -> TestServer {
        let context = AppContext::test().await;
        let mut session = UserSession::new("https://example.com/", "c", "r");
        session.micropub_endpoint = remote.url("/micropub");
        session.media_endpoint = remote.url("/media");
        session.access_token = "xxx".to_string();
        context.session_store.create(&session).await.unwrap();

        let mut server = TestServer::new(create_app(&context)).unwrap();
        server.add_cookie(Cookie::new("sessionid", session.uid));
        server
    }

    #[tokio::test]
    async fn gallery_defaults_to_latest_month() {
        let remote = MockServer::start_async().await;
        remote
            .mock_async(|when, then| {
                when.method(GET).path("/media").query_param("q", "years");
                then.status(200)
                    .json_body(serde_json::json!([{"year": "2019", "count": 3}]));
            })
            .await;
        remote
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/media")
                    .query_param("q", "months")
                    .query_param("year", "2019");
                then.status(200)
                    .json_body(serde_json::json!([{"month": "03", "count": 3}]));
            })
            .await;
        let media = remote
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/media")
                    .query_param("q", "source")
                    .query_param("limit", "15")
                    .query_param("year", "2019")
                    .query_param("month", "03");
                then.status(200).json_body(serde_json::json!({
                    "items": [{"url": "https://media.example.com/a.jpg", "mime_type": "image/jpeg"}],
                    "paging": {"after": "next-page"}
                }));
            })
            .await;
        let server = logged_in(&remote).await;

        let response = server.get("/composer/media/gallery").expect_success().await;

        media.assert_async().await;
        let page: serde_json::Value = response.json();
        assert_eq!(page["current_year"], "2019");
        assert_eq!(page["current_month"], "03");
        assert_eq!(page["after_key"], "next-page");
        assert_eq!(page["media"][0]["url"], "https://media.example.com/a.jpg");
    }

    #[tokio::test]
    async fn gallery_single_item() {
        let remote = MockServer::start_async().await;
        let item = remote
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/media")
                    .query_param("q", "source")
                    .query_param("url", "https://media.example.com/a.jpg?size=large");
                then.status(200).json_body(serde_json::json!({
                    "url": "https://media.example.com/a.jpg?size=large",
                    "lat": 53.8,
                    "lng": -1.55
                }));
            })
            .await;
        let server = logged_in(&remote).await;

        let response = server
            .get("/composer/media/gallery")
            .add_query_param("url", "https://media.example.com/a.jpg?size=large")
            .expect_success()
            .await;

        item.assert_async().await;
        let item: serde_json::Value = response.json();
        assert_eq!(item["lat"], 53.8);
    }

    #[tokio::test]
    async fn query_posts_with_cursor() {
        let remote = MockServer::start_async().await;
        let posts = remote
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/micropub")
                    .query_param("q", "source")
                    .query_param("after", "p2");
                then.status(200).json_body(serde_json::json!({
                    "items": [{"type": ["h-entry"], "properties": {"content": ["hello"]}}]
                }));
            })
            .await;
        remote
            .mock_async(|when, then| {
                when.method(GET).path("/micropub").query_param("q", "years");
                then.status(500);
            })
            .await;
        let server = logged_in(&remote).await;

        let response = server
            .get("/queryposts")
            .add_query_param("after", "p2")
            .expect_success()
            .await;

        posts.assert_async().await;
        let page: serde_json::Value = response.json();
        assert_eq!(page["posts"]["items"][0]["properties"]["content"][0], "hello");
        assert_eq!(page["years"], serde_json::json!([]));
    }
}
