//! IndieAuth login: the authorization redirect, the callback's code exchange
//! and bearer token verification.
//!
//! Every check in [`IndieAuthClient::callback`] happens before the session is
//! written, so a failed callback leaves the stored session untouched.

use std::sync::Arc;

use inari_common::{SessionId, UserSession};
use reqwest::{
    header::{ACCEPT, AUTHORIZATION},
    StatusCode,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    discovery::{DiscoveryError, EndpointDiscovery},
    persistence::{SessionLocks, SessionStore, StoreError},
};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The stored session's state is not the one sent back by the provider.
    #[error("state mismatch")]
    CsrfMismatch,
    /// The token endpoint refused the authorization code.
    #[error("token endpoint responded with {0}")]
    ProviderRejected(StatusCode),
    /// The token endpoint answered 200 with a body that isn't a token.
    #[error("invalid token endpoint response: {0}")]
    InvalidTokenResponse(String),
    /// The token was issued for a profile on another domain.
    #[error("domains do not match: {returned} is not on the domain of {claimed}")]
    DomainMismatch { claimed: String, returned: String },
    /// No token endpoint to talk to.
    #[error("no token endpoint")]
    MissingTokenEndpoint,
    #[error("token endpoint request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Successful response of the authorization code exchange.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VerifyCodeResponse {
    pub me: String,
    pub scope: String,
    pub access_token: String,
    pub token_type: String,
}

/// Token endpoint's answer to a bearer token verification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenResponse {
    pub me: String,
    pub client_id: String,
    pub scope: String,
    pub issued_by: String,
    pub error: String,
    pub error_description: String,
    #[serde(skip)]
    pub status_code: u16,
}

impl TokenResponse {
    /// Valid only for a 200 naming both a profile and a scope.
    pub fn is_valid(&self) -> bool {
        self.status_code == StatusCode::OK.as_u16()
            && !self.me.trim().is_empty()
            && !self.scope.trim().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct IndieAuthClient {
    http: reqwest::Client,
    discovery: EndpointDiscovery,
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
    /// Used by [`Self::verify_access_token`].
    token_endpoint: String,
}

impl IndieAuthClient {
    pub fn new(
        http: reqwest::Client,
        discovery: EndpointDiscovery,
        store: Arc<dyn SessionStore>,
        locks: SessionLocks,
        token_endpoint: String,
    ) -> Self {
        Self {
            http,
            discovery,
            store,
            locks,
            token_endpoint,
        }
    }

    /// Start a login for `me`.
    ///
    /// Returns the stored session and the authorization URL to redirect the user to.
    pub async fn init(
        &self,
        me: &str,
        client_id: &str,
        redirect_uri: &str,
    ) -> Result<(UserSession, Url), AuthError> {
        let mut session = UserSession::new(me, client_id, redirect_uri);

        let endpoints = self.discovery.discover(me).await?;
        session.authorization_endpoint = endpoints.authorization_endpoint;
        session.token_endpoint = endpoints.token_endpoint;
        session.micropub_endpoint = endpoints.micropub_endpoint;
        session.media_endpoint = endpoints.media_endpoint;
        session.hcard = endpoints.hcard;

        let redirect = authorization_url(&session)?;
        self.store.create(&session).await?;

        tracing::info!(me, session_id = %session.uid, "Login started");
        Ok((session, redirect))
    }

    /// Complete a login with the code the authorization endpoint sent back.
    pub async fn callback(
        &self,
        state: &str,
        code: &str,
        client_id: &str,
        redirect_uri: &str,
    ) -> Result<UserSession, AuthError> {
        let id = SessionId::new(state).map_err(StoreError::from)?;
        let _guard = self.locks.lock(&id).await;

        let mut session = self.store.fetch_by_id(&id).await?;
        if session.state != state {
            tracing::warn!(session_id = %id, "State values did not match");
            return Err(AuthError::CsrfMismatch);
        }
        if session.token_endpoint.is_empty() {
            return Err(AuthError::MissingTokenEndpoint);
        }

        let token_endpoint = Url::parse(&session.token_endpoint)?;
        let response = self
            .http
            .post(token_endpoint)
            .header(ACCEPT, "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", client_id),
                ("redirect_uri", redirect_uri),
                ("me", &session.me),
            ])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            tracing::warn!(
                token_endpoint = %session.token_endpoint,
                status = %response.status(),
                "Token endpoint returned a non-200"
            );
            return Err(AuthError::ProviderRejected(response.status()));
        }

        let body = response.bytes().await?;
        let verified: VerifyCodeResponse = serde_json::from_slice(&body)
            .map_err(|error| AuthError::InvalidTokenResponse(error.to_string()))?;
        if verified.access_token.is_empty() {
            return Err(AuthError::InvalidTokenResponse(
                "missing access_token".to_string(),
            ));
        }

        if !same_domain(&verified.me, &session.me) {
            return Err(AuthError::DomainMismatch {
                claimed: session.me,
                returned: verified.me,
            });
        }

        session.access_token = verified.access_token;
        session.token_type = verified.token_type;
        self.store.create(&session).await?;

        tracing::info!(me = %session.me, session_id = %id, "Logged in");
        Ok(session)
    }

    /// Ask the configured token endpoint about a bearer token.
    ///
    /// `bearer_token` is sent as the whole `Authorization` header value.
    pub async fn verify_access_token(&self, bearer_token: &str) -> Result<TokenResponse, AuthError> {
        if self.token_endpoint.is_empty() {
            return Err(AuthError::MissingTokenEndpoint);
        }

        let response = self
            .http
            .get(Url::parse(&self.token_endpoint)?)
            .header(AUTHORIZATION, bearer_token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status_code = response.status().as_u16();
        let body = response.bytes().await?;
        // A rejected token may come back as plain text. Only a 200 must decode.
        let mut token: TokenResponse = match serde_json::from_slice(&body) {
            Ok(token) => token,
            Err(error) if status_code == StatusCode::OK.as_u16() => {
                return Err(AuthError::InvalidTokenResponse(error.to_string()));
            }
            Err(_) => TokenResponse::default(),
        };
        token.status_code = status_code;

        Ok(token)
    }
}

/// The authorization endpoint URL with the login request in its query.
pub fn authorization_url(session: &UserSession) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&session.authorization_endpoint)?;
    url.query_pairs_mut()
        .append_pair("me", &session.me)
        .append_pair("client_id", &session.client_id)
        .append_pair("redirect_uri", &session.redirect_uri)
        .append_pair("state", &session.state)
        .append_pair("scope", &session.scope)
        .append_pair("response_type", "code");
    Ok(url)
}

/// Both URLs have the same host, ignoring case and a trailing dot.
pub fn same_domain(returned: &str, claimed: &str) -> bool {
    fn host(url: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        let host = url.host_str()?.trim_end_matches('.').to_ascii_lowercase();
        (!host.is_empty()).then_some(host)
    }

    matches!((host(returned), host(claimed)), (Some(a), Some(b)) if a == b)
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use httpmock::prelude::*;
    use inari_micropub::HttpMicropubClient;

    use super::*;
    use crate::persistence::OpendalSessionStore;

    const CLIENT_ID: &str = "https://admin.example/";
    const REDIRECT_URI: &str = "https://admin.example/cb";

    fn client(store: Arc<dyn SessionStore>, token_endpoint: &str) -> IndieAuthClient {
        let micropub = HttpMicropubClient::builder()
            .request_timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        let http = micropub.http().clone();
        IndieAuthClient::new(
            http.clone(),
            EndpointDiscovery::new(http, Arc::new(micropub)),
            store,
            SessionLocks::new(),
            token_endpoint.to_string(),
        )
    }

    fn pending_session(me: &str, token_endpoint: &str) -> UserSession {
        let mut session = UserSession::new(me, CLIENT_ID, REDIRECT_URI);
        session.authorization_endpoint = "https://auth.example.com/auth".to_string();
        session.token_endpoint = token_endpoint.to_string();
        session
    }

    #[test]
    fn same_domain_compares_hosts() {
        assert!(same_domain("https://example.com/", "http://example.com/jay"));
        assert!(same_domain("https://EXAMPLE.com./", "https://example.com"));
        assert!(!same_domain("https://jay.example.com", "http://example.com/jay"));
        assert!(!same_domain("https://evil.co.uk/", "https://jay.co.uk/"));
        assert!(!same_domain("", "https://example.com/"));
        assert!(!same_domain("mailto:jay@example.com", "https://example.com/"));
    }

    #[test]
    fn authorization_url_query() {
        let session = pending_session("https://example.com/jay", "");
        let url = authorization_url(&session).unwrap();

        assert!(url
            .as_str()
            .starts_with("https://auth.example.com/auth?me=https%3A%2F%2Fexample.com%2Fjay&"));
        let query: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query.len(), 6);
        assert_eq!(query["me"], "https://example.com/jay");
        assert_eq!(query["client_id"], CLIENT_ID);
        assert_eq!(query["redirect_uri"], REDIRECT_URI);
        assert_eq!(query["state"], session.uid);
        assert_eq!(query["scope"], "create");
        assert_eq!(query["response_type"], "code");
    }

    #[tokio::test]
    async fn init_stores_session_and_redirects() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jay");
                then.status(200).body(
                    r#"<link rel="authorization_endpoint" href="https://auth.example.com/auth">
                    <link rel="token_endpoint" href="/token">"#,
                );
            })
            .await;
        let store = Arc::new(OpendalSessionStore::in_memory());
        let me = server.url("/jay");

        let (session, redirect) = client(store.clone(), "")
            .init(&me, CLIENT_ID, REDIRECT_URI)
            .await
            .unwrap();

        assert!(redirect.as_str().starts_with("https://auth.example.com/auth?"));
        let query: HashMap<_, _> = redirect.query_pairs().into_owned().collect();
        assert_eq!(query["state"], session.uid);
        assert_eq!(query["me"], me);

        let stored = store.fetch_by_id(&session.id().unwrap()).await.unwrap();
        assert_eq!(stored.uid, stored.state);
        assert_eq!(stored.token_endpoint, server.url("/token"));
        assert!(stored.access_token.is_empty());
        assert_eq!(stored, session);
    }

    #[tokio::test]
    async fn init_discovery_failure_stores_nothing() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jay");
                then.status(200).body("<p>no endpoints</p>");
            })
            .await;

        let error = client(Arc::new(OpendalSessionStore::in_memory()), "")
            .init(&server.url("/jay"), CLIENT_ID, REDIRECT_URI)
            .await
            .unwrap_err();

        assert!(matches!(error, AuthError::Discovery(_)));
    }

    #[tokio::test]
    async fn callback_success() {
        let server = MockServer::start_async().await;
        let token = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/token")
                    .header("accept", "application/json")
                    .x_www_form_urlencoded_tuple("grant_type", "authorization_code")
                    .x_www_form_urlencoded_tuple("code", "the-code")
                    .x_www_form_urlencoded_tuple("client_id", CLIENT_ID)
                    .x_www_form_urlencoded_tuple("redirect_uri", REDIRECT_URI)
                    .x_www_form_urlencoded_tuple("me", "http://example.com/jay");
                then.status(200).json_body(serde_json::json!({
                    "me": "https://example.com/",
                    "scope": "create",
                    "access_token": "xxx",
                    "token_type": "Bearer"
                }));
            })
            .await;
        let store = Arc::new(OpendalSessionStore::in_memory());
        let session = pending_session("http://example.com/jay", &server.url("/token"));
        store.create(&session).await.unwrap();

        let authenticated = client(store.clone(), "")
            .callback(&session.state, "the-code", CLIENT_ID, REDIRECT_URI)
            .await
            .unwrap();

        token.assert_async().await;
        assert_eq!(authenticated.access_token, "xxx");
        assert_eq!(authenticated.token_type, "Bearer");

        let stored = store.fetch_by_id(&session.id().unwrap()).await.unwrap();
        assert!(stored.is_authenticated());
    }

    #[tokio::test]
    async fn callback_unknown_state_makes_no_token_request() {
        let server = MockServer::start_async().await;
        let token = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200);
            })
            .await;

        let error = client(Arc::new(OpendalSessionStore::in_memory()), "")
            .callback(&SessionId::random().to_string(), "code", CLIENT_ID, REDIRECT_URI)
            .await
            .unwrap_err();

        assert!(matches!(error, AuthError::Store(StoreError::NotFound(_))));
        token.assert_hits_async(0).await;
    }

    /// A store that hands back a session other than the one asked for.
    #[derive(Debug)]
    struct WrongRecordStore(UserSession);

    #[async_trait::async_trait]
    impl SessionStore for WrongRecordStore {
        async fn create(&self, _session: &UserSession) -> Result<(), StoreError> {
            panic!("nothing may be written after a state mismatch");
        }

        async fn fetch_by_id(&self, _id: &SessionId) -> Result<UserSession, StoreError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn callback_state_mismatch_makes_no_token_request() {
        let server = MockServer::start_async().await;
        let token = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200);
            })
            .await;
        let other = pending_session("http://example.com/jay", &server.url("/token"));

        let error = client(Arc::new(WrongRecordStore(other)), "")
            .callback(&SessionId::random().to_string(), "code", CLIENT_ID, REDIRECT_URI)
            .await
            .unwrap_err();

        assert!(matches!(error, AuthError::CsrfMismatch));
        token.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn callback_provider_rejects() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(400)
                    .json_body(serde_json::json!({"error": "invalid_grant"}));
            })
            .await;
        let store = Arc::new(OpendalSessionStore::in_memory());
        let session = pending_session("http://example.com/jay", &server.url("/token"));
        store.create(&session).await.unwrap();

        let error = client(store.clone(), "")
            .callback(&session.state, "code", CLIENT_ID, REDIRECT_URI)
            .await
            .unwrap_err();

        assert!(matches!(error, AuthError::ProviderRejected(StatusCode::BAD_REQUEST)));
        let stored = store.fetch_by_id(&session.id().unwrap()).await.unwrap();
        assert!(stored.access_token.is_empty());
    }

    #[tokio::test]
    async fn callback_domain_mismatch() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(200).json_body(serde_json::json!({
                    "me": "https://jay.example.com",
                    "scope": "create",
                    "access_token": "xxx",
                    "token_type": "Bearer"
                }));
            })
            .await;
        let store = Arc::new(OpendalSessionStore::in_memory());
        let session = pending_session("http://example.com/jay", &server.url("/token"));
        store.create(&session).await.unwrap();

        let error = client(store.clone(), "")
            .callback(&session.state, "code", CLIENT_ID, REDIRECT_URI)
            .await
            .unwrap_err();

        assert!(matches!(error, AuthError::DomainMismatch { .. }));
        let stored = store.fetch_by_id(&session.id().unwrap()).await.unwrap();
        assert!(stored.access_token.is_empty());
    }

    #[tokio::test]
    async fn callback_without_token_endpoint() {
        let store = Arc::new(OpendalSessionStore::in_memory());
        let session = pending_session("http://example.com/jay", "");
        store.create(&session).await.unwrap();

        let error = client(store, "")
            .callback(&session.state, "code", CLIENT_ID, REDIRECT_URI)
            .await
            .unwrap_err();

        assert!(matches!(error, AuthError::MissingTokenEndpoint));
    }

    #[tokio::test]
    async fn callback_invalid_state() {
        let error = client(Arc::new(OpendalSessionStore::in_memory()), "")
            .callback("../../etc/passwd", "code", CLIENT_ID, REDIRECT_URI)
            .await
            .unwrap_err();

        assert!(matches!(error, AuthError::Store(StoreError::InvalidId(_))));
    }

    #[tokio::test]
    async fn verify_access_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/token")
                    .header("authorization", "Bearer xxx")
                    .header("accept", "application/json");
                then.status(200).json_body(serde_json::json!({
                    "me": "https://example.com/",
                    "client_id": CLIENT_ID,
                    "scope": "create",
                    "issued_by": "https://auth.example.com/token"
                }));
            })
            .await;

        let token = client(Arc::new(OpendalSessionStore::in_memory()), &server.url("/token"))
            .verify_access_token("Bearer xxx")
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(token.is_valid());
        assert_eq!(token.client_id, CLIENT_ID);
    }

    #[tokio::test]
    async fn verify_access_token_invalid() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/token");
                then.status(401).json_body(serde_json::json!({
                    "error": "unauthorized",
                    "error_description": "token revoked"
                }));
            })
            .await;

        let token = client(Arc::new(OpendalSessionStore::in_memory()), &server.url("/token"))
            .verify_access_token("Bearer revoked")
            .await
            .unwrap();

        assert!(!token.is_valid());
        assert_eq!(token.error_description, "token revoked");

        let blank_scope = TokenResponse {
            me: "https://example.com/".to_string(),
            scope: " ".to_string(),
            status_code: 200,
            ..Default::default()
        };
        assert!(!blank_scope.is_valid());
    }

    #[tokio::test]
    async fn verify_access_token_plain_text_rejection() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/token").header("authorization", "Bearer revoked");
                then.status(401).body("Unauthorized");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/token").header("authorization", "Bearer garbled");
                then.status(200).body("<html>ok</html>");
            })
            .await;
        let client = client(Arc::new(OpendalSessionStore::in_memory()), &server.url("/token"));

        let token = client.verify_access_token("Bearer revoked").await.unwrap();
        assert!(!token.is_valid());
        assert_eq!(token.status_code, 401);

        let error = client.verify_access_token("Bearer garbled").await.unwrap_err();
        assert!(matches!(error, AuthError::InvalidTokenResponse(_)));
    }
}
