//! Inari user session.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{composer::ComposerData, hcard::HCard};

/// Scope requested from the authorization endpoint.
pub const DEFAULT_SCOPE: &str = "create";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// One authentication attempt, and after a successful callback, one logged-in user.
///
/// `uid` doubles as the CSRF state token sent to the authorization endpoint.
pub struct UserSession {
    /// Opaque session identifier.
    pub uid: String,
    /// Claimed profile URL.
    pub me: String,
    /// IndieAuth client id of this application.
    pub client_id: String,
    /// Where the authorization endpoint sends the user back to.
    pub redirect_uri: String,
    /// Requested scope.
    pub scope: String,
    /// CSRF state, equal to `uid` at creation.
    pub state: String,
    /// Discovered authorization endpoint.
    pub authorization_endpoint: String,
    /// Discovered token endpoint.
    pub token_endpoint: String,
    /// Discovered Micropub endpoint.
    pub micropub_endpoint: String,
    /// Media endpoint advertised by the Micropub endpoint's config.
    pub media_endpoint: String,
    /// Access token, empty until the callback succeeds.
    pub access_token: String,
    /// Token type returned alongside the access token.
    pub token_type: String,
    /// Post staged in the composer.
    pub composer_data: ComposerData,
    /// Author card discovered on the profile page.
    pub hcard: HCard,
}

impl UserSession {
    /// Start a new authentication attempt with a fresh random id.
    pub fn new(me: &str, client_id: &str, redirect_uri: &str) -> Self {
        let uid = SessionId::random().to_string();

        Self {
            state: uid.clone(),
            uid,
            me: me.to_string(),
            client_id: client_id.to_string(),
            redirect_uri: redirect_uri.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            ..Default::default()
        }
    }

    /// True once the token exchange succeeded.
    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// The validated id of this session.
    pub fn id(&self) -> Result<SessionId, SessionIdError> {
        SessionId::new(&self.uid)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// A validated session id: non-empty ASCII alphanumerics and `-`.
///
/// Session ids end up in storage keys and cookies, so nothing else is accepted.
pub struct SessionId(String);

impl SessionId {
    /// Validate an id received from a cookie or a callback `state`.
    pub fn new(value: &str) -> Result<Self, SessionIdError> {
        if value.is_empty() {
            return Err(SessionIdError::Empty);
        }
        if let Some(c) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
        {
            return Err(SessionIdError::InvalidCharacter(c));
        }

        Ok(Self(value.to_string()))
    }

    /// A new random (UUID v4) id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
/// Error validating a [SessionId].
pub enum SessionIdError {
    #[error("Session id is empty")]
    /// Empty id.
    Empty,

    #[error("Session id contains an invalid character {0:?}")]
    /// Character outside `[A-Za-z0-9-]`.
    InvalidCharacter(char),
}
