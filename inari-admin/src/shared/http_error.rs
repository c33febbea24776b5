//! Server error
use axum::{http::StatusCode, response::IntoResponse};

use crate::{
    composer::ComposerError, discovery::DiscoveryError, indieauth::AuthError,
    persistence::StoreError,
};

pub(crate) type HttpResult<T, E = HttpError> = core::result::Result<T, E>;

#[derive(Debug, Clone)]
pub(crate) struct HttpError {
    status: StatusCode,
    detail: Option<String>,
}

impl Default for HttpError {
    fn default() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: None,
        }
    }
}

impl HttpError {
    pub fn new(status_code: StatusCode, message: Option<impl ToString>) -> HttpError {
        Self {
            status: status_code,
            detail: message.map(|m| m.to_string()),
        }
    }

    pub fn internal_server() -> HttpError {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, Some("Internal server error"))
    }

    pub fn bad_request(message: impl ToString) -> HttpError {
        Self::new(StatusCode::BAD_REQUEST, Some(message))
    }

    pub fn forbidden() -> HttpError {
        Self::new(StatusCode::FORBIDDEN, Some("Forbidden"))
    }

    pub fn unauthorized() -> HttpError {
        Self::new(StatusCode::UNAUTHORIZED, Some("Unauthorized"))
    }

    pub fn bad_gateway(message: impl ToString) -> HttpError {
        Self::new(StatusCode::BAD_GATEWAY, Some(message))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        match self.detail {
            Some(detail) => (self.status, detail).into_response(),
            _ => (self.status,).into_response(),
        }
    }
}

// === INTERNAL_SERVER_ERROR ===
// Very common errors that we can just convert to a Internal Server Error.
// This way, we can use `?` to propagate errors without having to handle them.

impl From<anyhow::Error> for HttpError {
    fn from(error: anyhow::Error) -> Self {
        tracing::error!(?error);
        Self::internal_server()
    }
}

impl From<StoreError> for HttpError {
    fn from(error: StoreError) -> Self {
        tracing::error!(?error);
        Self::internal_server()
    }
}

impl From<inari_micropub::Error> for HttpError {
    fn from(error: inari_micropub::Error) -> Self {
        tracing::error!(?error);
        Self::internal_server()
    }
}

// === Domain errors ===

impl From<DiscoveryError> for HttpError {
    fn from(error: DiscoveryError) -> Self {
        tracing::warn!(?error, "Endpoint discovery failed");
        Self::bad_request(error)
    }
}

impl From<AuthError> for HttpError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Discovery(error) => error.into(),
            AuthError::Store(error) => error.into(),
            AuthError::CsrfMismatch
            | AuthError::ProviderRejected(_)
            | AuthError::InvalidTokenResponse(_)
            | AuthError::DomainMismatch { .. } => {
                tracing::warn!(?error, "Login refused");
                Self::forbidden()
            }
            error => {
                tracing::error!(?error);
                Self::internal_server()
            }
        }
    }
}

impl From<ComposerError> for HttpError {
    fn from(error: ComposerError) -> Self {
        match error {
            ComposerError::Store(error) => error.into(),
            ComposerError::Micropub(error) => error.into(),
            ComposerError::SubmitRejected { status } => {
                Self::bad_gateway(format!("Micropub endpoint responded with {status}"))
            }
            ComposerError::NotAuthenticated => Self::forbidden(),
        }
    }
}
