//! Endpoint discovery for a claimed profile URL.
//!
//! The profile page is fetched once. `authorization_endpoint`, `token_endpoint`
//! and `micropub` come from its `Link` headers when there are any, otherwise
//! from `<link rel>` elements in the body. The media endpoint comes from the
//! Micropub endpoint's `q=config`, and the author card from the page's h-card.

mod html;
mod link_header;

use std::sync::Arc;

use inari_common::HCard;
use inari_micropub::MicropubClient;
use reqwest::{header::LINK, StatusCode};
use scraper::Html;
use url::Url;

pub use link_header::Link;

pub const AUTHORIZATION_ENDPOINT: &str = "authorization_endpoint";
pub const TOKEN_ENDPOINT: &str = "token_endpoint";
pub const MICROPUB: &str = "micropub";

/// Why a profile URL could not be used to log in.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// `me` is not an absolute URL.
    #[error("invalid profile URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The profile page could not be fetched.
    #[error("failed to fetch profile page: {0}")]
    Transport(#[from] reqwest::Error),
    /// The profile page answered with something other than 200.
    #[error("profile page responded with {0}")]
    Status(StatusCode),
    /// The profile page doesn't advertise an authorization endpoint.
    #[error("no authorization_endpoint found on {0}")]
    MissingAuthorizationEndpoint(Url),
}

/// Everything learned about a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredEndpoints {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub micropub_endpoint: String,
    pub media_endpoint: String,
    pub hcard: HCard,
}

#[derive(Debug, Clone)]
pub struct EndpointDiscovery {
    http: reqwest::Client,
    micropub: Arc<dyn MicropubClient>,
}

impl EndpointDiscovery {
    pub fn new(http: reqwest::Client, micropub: Arc<dyn MicropubClient>) -> Self {
        Self { http, micropub }
    }

    pub async fn discover(&self, me: &str) -> Result<DiscoveredEndpoints, DiscoveryError> {
        let profile = Url::parse(me)?;

        let response = self.http.get(profile.clone()).send().await?;
        if response.status() != StatusCode::OK {
            return Err(DiscoveryError::Status(response.status()));
        }

        let links: Vec<Link> = response
            .headers()
            .get_all(LINK)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(link_header::parse)
            .collect();
        let body = response.text().await?;

        let mut endpoints = scan_profile(&profile, &links, &body);
        if endpoints.authorization_endpoint.is_empty() {
            return Err(DiscoveryError::MissingAuthorizationEndpoint(profile));
        }

        if !endpoints.micropub_endpoint.is_empty() {
            endpoints.media_endpoint = self.discover_media_endpoint(&endpoints.micropub_endpoint).await;
        }

        tracing::debug!(
            me,
            authorization_endpoint = %endpoints.authorization_endpoint,
            token_endpoint = %endpoints.token_endpoint,
            micropub_endpoint = %endpoints.micropub_endpoint,
            media_endpoint = %endpoints.media_endpoint,
            "Discovered endpoints"
        );
        Ok(endpoints)
    }

    /// Best effort, an empty string when the config can't be read.
    async fn discover_media_endpoint(&self, micropub_endpoint: &str) -> String {
        match self.micropub.fetch_config(micropub_endpoint).await {
            Ok(config) if !config.media_endpoint.is_empty() => {
                resolve(micropub_endpoint, &config.media_endpoint)
            }
            Ok(_) => {
                tracing::info!(micropub_endpoint, "Micropub config has no media-endpoint");
                String::new()
            }
            Err(error) => {
                tracing::warn!(?error, micropub_endpoint, "Failed to fetch micropub config");
                String::new()
            }
        }
    }
}

/// Parses the page synchronously: the parsed document is not `Send` and must
/// not live across an await.
fn scan_profile(profile: &Url, links: &[Link], body: &str) -> DiscoveredEndpoints {
    let document = Html::parse_document(body);

    let find = |rel: &str| -> String {
        let href = if links.is_empty() {
            html::find_link_rel(document.root_element(), rel)
        } else {
            links
                .iter()
                .find(|link| link.has_rel(rel))
                .map(|link| link.uri.clone())
        };
        href.map(|href| resolve(profile.as_str(), &href))
            .unwrap_or_default()
    };

    DiscoveredEndpoints {
        authorization_endpoint: find(AUTHORIZATION_ENDPOINT),
        token_endpoint: find(TOKEN_ENDPOINT),
        micropub_endpoint: find(MICROPUB),
        media_endpoint: String::new(),
        hcard: html::representative_hcard(&document, profile),
    }
}

fn resolve(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(href.trim()))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| href.to_string())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use inari_micropub::HttpMicropubClient;

    use super::*;

    fn discovery() -> EndpointDiscovery {
        let client = HttpMicropubClient::builder()
            .request_timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        EndpointDiscovery::new(client.http().clone(), Arc::new(client))
    }

    #[tokio::test]
    async fn discovers_from_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jay");
                then.status(200).body(
                    r#"<html><head>
                    <link rel="authorization_endpoint" href="https://auth.example.com/auth">
                    <link rel="token_endpoint" href="/token">
                    <link rel="micropub" href="/micropub">
                    </head><body></body></html>"#,
                );
            })
            .await;
        let config = server
            .mock_async(|when, then| {
                when.method(GET).path("/micropub").query_param("q", "config");
                then.status(200)
                    .json_body(serde_json::json!({"media-endpoint": "/media"}));
            })
            .await;

        let endpoints = discovery().discover(&server.url("/jay")).await.unwrap();

        config.assert_async().await;
        assert_eq!(endpoints.authorization_endpoint, "https://auth.example.com/auth");
        assert_eq!(endpoints.token_endpoint, server.url("/token"));
        assert_eq!(endpoints.micropub_endpoint, server.url("/micropub"));
        assert_eq!(endpoints.media_endpoint, server.url("/media"));
    }

    #[tokio::test]
    async fn link_header_takes_precedence_over_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200)
                    .header("Link", r#"<https://header.example.com/auth>; rel="authorization_endpoint""#)
                    .body(
                        r#"<link rel="authorization_endpoint" href="https://body.example.com/auth">
                        <link rel="micropub" href="https://body.example.com/micropub">"#,
                    );
            })
            .await;

        let endpoints = discovery().discover(&server.url("/")).await.unwrap();

        assert_eq!(endpoints.authorization_endpoint, "https://header.example.com/auth");
        // Once any Link header exists the body is not consulted at all.
        assert_eq!(endpoints.micropub_endpoint, "");
        assert_eq!(endpoints.media_endpoint, "");
    }

    #[tokio::test]
    async fn media_endpoint_failure_is_not_fatal() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).body(format!(
                    r#"<link rel="authorization_endpoint" href="https://auth.example.com/auth">
                    <link rel="micropub" href="{}">"#,
                    server.url("/micropub")
                ));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/micropub");
                then.status(500);
            })
            .await;

        let endpoints = discovery().discover(&server.url("/")).await.unwrap();

        assert_eq!(endpoints.micropub_endpoint, server.url("/micropub"));
        assert_eq!(endpoints.media_endpoint, "");
    }

    #[tokio::test]
    async fn hcard_is_discovered() {
        let server = MockServer::start_async().await;
        let profile = server.url("/");
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).body(format!(
                    r#"<link rel="authorization_endpoint" href="https://auth.example.com/auth">
                    <div class="h-card"><a class="p-name u-url u-uid" href="{profile}">Jay</a>
                    <img class="u-photo" src="/me.jpg"></div>"#
                ));
            })
            .await;

        let endpoints = discovery().discover(&profile).await.unwrap();

        assert_eq!(endpoints.hcard.name, "Jay");
        assert_eq!(endpoints.hcard.url, profile);
        assert_eq!(endpoints.hcard.photo, server.url("/me.jpg"));
    }

    #[tokio::test]
    async fn missing_authorization_endpoint() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).body(r#"<link rel="micropub" href="/micropub">"#);
            })
            .await;

        let error = discovery().discover(&server.url("/")).await.unwrap_err();
        assert!(matches!(error, DiscoveryError::MissingAuthorizationEndpoint(_)));
    }

    #[tokio::test]
    async fn non_200_profile() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(404);
            })
            .await;

        let error = discovery().discover(&server.url("/")).await.unwrap_err();
        assert!(matches!(error, DiscoveryError::Status(StatusCode::NOT_FOUND)));
    }

    #[tokio::test]
    async fn invalid_profile_url() {
        let error = discovery().discover("example.com").await.unwrap_err();
        assert!(matches!(error, DiscoveryError::InvalidUrl(_)));
    }
}
