//! Error types for the `inari-micropub` crate.
//!
//! A single top-level [`Error`] plus the [`Result`] alias. Transport and server
//! failures are kept apart so callers can tell "the remote said no" from "the
//! remote could not be reached".

use thiserror::Error;

/// Errors that can occur while building a [`crate::HttpMicropubClient`].
#[derive(Debug, Error)]
pub enum BuildError {
    /// Failed to build the HTTP client (reqwest configuration).
    #[error("Failed to build the HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// The crate's top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request/response failed (transport, server, validation, JSON).
    #[error("Request failed: {0}")]
    Request(#[from] RequestError),

    /// An endpoint URL could not be parsed.
    #[error("Failed to parse URL: {0}")]
    Parse(#[from] url::ParseError),

    /// Building the client failed.
    #[error("Client build failed: {0}")]
    Build(#[from] BuildError),
}

impl Error {
    /// True when the remote endpoint could not be reached or timed out.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Request(RequestError::Transport(_)))
    }
}

/// Transport and server-side HTTP errors.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Network/protocol failure from reqwest (timeouts, TLS, I/O, etc.).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server returned a non-success status.
    #[error("Server responded with an error: {status} - {message}")]
    Server {
        /// The HTTP status code returned by the server.
        status: reqwest::StatusCode,
        /// The response body, or the canonical reason when it could not be read.
        message: String,
    },

    /// The response was well formed HTTP but is missing something required.
    #[error("Invalid response: {message}")]
    Validation {
        /// What was missing or invalid.
        message: String,
    },

    /// JSON decoding failed when parsing a server response.
    #[error("JSON decode error: {message}")]
    DecodeJson {
        /// Error message from the JSON deserializer.
        message: String,
    },
}

/// A specialized `Result` type for `inari-micropub` operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Request(err.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Request(RequestError::DecodeJson {
            message: err.to_string(),
        })
    }
}
