use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use inari_common::UserSession;
use reqwest::{
    header::{ACCEPT, LOCATION},
    multipart::{Form, Part},
    RequestBuilder, Response,
};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    errors::{BuildError, Error, RequestError, Result},
    types::{
        ArchiveMonth, ArchiveYear, MediaEndpointResponse, MediaFile, MediaItem, MediaList,
        MediaQuery, MicropubConfig, MicropubResponse, PostList,
    },
};

const DEFAULT_USER_AGENT: &str = concat!("inari-admin", "@", env!("CARGO_PKG_VERSION"),);

/// Page size requested from the media endpoint.
pub const MEDIA_PAGE_SIZE: &str = "15";

/// Operations against a user's Micropub and media endpoints.
///
/// [`HttpMicropubClient`] is the production implementation.
#[async_trait]
pub trait MicropubClient: Send + Sync + Debug {
    /// POST a form-urlencoded create request.
    ///
    /// A non-2xx status is returned in the [`MicropubResponse`], only transport
    /// failures are errors.
    async fn send_request(
        &self,
        form: &[(String, String)],
        endpoint: &str,
        token: &str,
    ) -> Result<MicropubResponse>;

    /// Upload one file to the session's media endpoint.
    async fn upload_to_media_server(
        &self,
        file: MediaFile,
        session: &UserSession,
    ) -> Result<MediaEndpointResponse>;

    /// `q=source[&after=]`
    async fn query_post_list(
        &self,
        endpoint: &str,
        token: &str,
        after: Option<&str>,
    ) -> Result<PostList>;

    /// `q=years`
    async fn query_years_list(&self, endpoint: &str, token: &str) -> Result<Vec<ArchiveYear>>;

    /// `q=months&year=`
    async fn query_months_list(
        &self,
        endpoint: &str,
        token: &str,
        year: &str,
    ) -> Result<Vec<ArchiveMonth>>;

    /// `q=source&limit=15` plus either `year`/`month` or `after`.
    async fn query_media_list(
        &self,
        endpoint: &str,
        token: &str,
        query: &MediaQuery,
    ) -> Result<MediaList>;

    /// `q=source&url=`
    async fn query_media_url(&self, endpoint: &str, token: &str, url: &str) -> Result<MediaItem>;

    /// `q=config`, unauthenticated.
    async fn fetch_config(&self, endpoint: &str) -> Result<MicropubConfig>;
}

#[derive(Debug, Clone, Default)]
#[must_use]
/// Configures a [`HttpMicropubClient`] before construction.
///
/// # Defaults
/// - request timeout: none unless set via [`Self::request_timeout`]
/// - user-agent: `inari-admin@<crate-version>` plus any [`Self::user_agent_extra`]
pub struct HttpMicropubClientBuilder {
    http_request_timeout: Option<Duration>,
    user_agent_extra: Option<String>,
}

impl HttpMicropubClientBuilder {
    /// Set HTTP requests timeout.
    pub fn request_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.http_request_timeout = Some(timeout);

        self
    }

    /// Append an extra user-agent segment after the default `inari-admin@<version>`.
    pub fn user_agent_extra<S: Into<String>>(&mut self, extra: S) -> &mut Self {
        self.user_agent_extra = Some(extra.into());
        self
    }

    /// Build [HttpMicropubClient]
    pub fn build(&self) -> std::result::Result<HttpMicropubClient, BuildError> {
        let user_agent = match &self.user_agent_extra {
            Some(extra) if !extra.trim().is_empty() => {
                &format!("{DEFAULT_USER_AGENT} {}", extra.trim())
            }
            _ => DEFAULT_USER_AGENT,
        };

        let mut http_builder = reqwest::Client::builder().user_agent(user_agent);

        if let Some(timeout) = self.http_request_timeout {
            http_builder = http_builder.timeout(timeout);
        }

        Ok(HttpMicropubClient {
            http: http_builder.build()?,
        })
    }
}

/// reqwest backed [`MicropubClient`].
///
/// Cloning is cheap, all clones share one connection pool. The inner
/// [`reqwest::Client`] is exposed so profile discovery and the token exchange go
/// through the same pool and deadline.
#[derive(Clone, Debug)]
pub struct HttpMicropubClient {
    http: reqwest::Client,
}

impl HttpMicropubClient {
    /// Client with default settings.
    pub fn new() -> std::result::Result<Self, BuildError> {
        Self::builder().build()
    }

    /// Returns a builder to edit settings before creating [`HttpMicropubClient`].
    pub fn builder() -> HttpMicropubClientBuilder {
        HttpMicropubClientBuilder::default()
    }

    /// The shared HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, token: Option<&str>) -> Result<T> {
        tracing::debug!(endpoint = %url, "Querying endpoint");

        let mut request = self.http.get(url).header(ACCEPT, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        decode_json(send(request).await?).await
    }
}

#[async_trait]
impl MicropubClient for HttpMicropubClient {
    async fn send_request(
        &self,
        form: &[(String, String)],
        endpoint: &str,
        token: &str,
    ) -> Result<MicropubResponse> {
        let url = Url::parse(endpoint)?;
        tracing::info!(micropub_endpoint = %url, "Sending micropub request");

        let response = self.http.post(url).bearer_auth(token).form(form).send().await?;

        let status = response.status();
        tracing::info!(%status, "Micropub response");

        Ok(MicropubResponse {
            status,
            location: header_location(&response),
        })
    }

    async fn upload_to_media_server(
        &self,
        file: MediaFile,
        session: &UserSession,
    ) -> Result<MediaEndpointResponse> {
        let url = Url::parse(&session.media_endpoint)?;

        let mut part = Part::bytes(file.data).file_name(file.file_name);
        if let Some(content_type) = file.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }

        tracing::info!(media_endpoint = %url, "Uploading file to media endpoint");
        let request = self
            .http
            .post(url)
            .bearer_auth(&session.access_token)
            .multipart(Form::new().part("file", part));
        let response = send(request).await?;

        let location = header_location(&response);
        let body = response.bytes().await?;

        let mut media = if body.is_empty() {
            MediaEndpointResponse::default()
        } else {
            serde_json::from_slice(&body).unwrap_or_else(|error| {
                tracing::warn!(?error, "Failed to decode media endpoint response body");
                MediaEndpointResponse::default()
            })
        };

        if let Some(location) = location {
            media.url = location;
        }
        if media.url.is_empty() {
            return Err(RequestError::Validation {
                message: "media endpoint did not return a Location".to_string(),
            }
            .into());
        }

        Ok(media)
    }

    async fn query_post_list(
        &self,
        endpoint: &str,
        token: &str,
        after: Option<&str>,
    ) -> Result<PostList> {
        let mut url = Url::parse(endpoint)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("q", "source");
            if let Some(after) = after.filter(|after| !after.is_empty()) {
                query.append_pair("after", after);
            }
        }

        self.get_json(url, Some(token)).await
    }

    async fn query_years_list(&self, endpoint: &str, token: &str) -> Result<Vec<ArchiveYear>> {
        let mut url = Url::parse(endpoint)?;
        url.query_pairs_mut().append_pair("q", "years");

        self.get_json(url, Some(token)).await
    }

    async fn query_months_list(
        &self,
        endpoint: &str,
        token: &str,
        year: &str,
    ) -> Result<Vec<ArchiveMonth>> {
        let mut url = Url::parse(endpoint)?;
        url.query_pairs_mut()
            .append_pair("q", "months")
            .append_pair("year", year);

        self.get_json(url, Some(token)).await
    }

    async fn query_media_list(
        &self,
        endpoint: &str,
        token: &str,
        query: &MediaQuery,
    ) -> Result<MediaList> {
        let mut url = Url::parse(endpoint)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("q", "source")
                .append_pair("limit", MEDIA_PAGE_SIZE);
            match query {
                MediaQuery::Month { year, month } => {
                    pairs.append_pair("year", year).append_pair("month", month);
                }
                MediaQuery::After(after) => {
                    pairs.append_pair("after", after);
                }
            }
        }

        self.get_json(url, Some(token)).await
    }

    async fn query_media_url(&self, endpoint: &str, token: &str, url: &str) -> Result<MediaItem> {
        let mut endpoint = Url::parse(endpoint)?;
        endpoint
            .query_pairs_mut()
            .append_pair("q", "source")
            .append_pair("url", url);

        self.get_json(endpoint, Some(token)).await
    }

    async fn fetch_config(&self, endpoint: &str) -> Result<MicropubConfig> {
        let mut url = Url::parse(endpoint)?;
        url.query_pairs_mut().append_pair("q", "config");

        self.get_json(url, None).await
    }
}

/// Send a request, converting non-2xx responses into [`RequestError::Server`].
async fn send(request: RequestBuilder) -> Result<Response> {
    let response = request.send().await?;

    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let message = response.text().await.unwrap_or_else(|_| {
        status
            .canonical_reason()
            .unwrap_or("Unknown Error")
            .to_string()
    });

    Err(Error::from(RequestError::Server { status, message }))
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

fn header_location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
