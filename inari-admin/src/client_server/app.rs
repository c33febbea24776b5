use std::{net::SocketAddr, net::TcpListener, path::PathBuf, time::Duration};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use axum_server::Handle;
use futures_util::TryFutureExt;
use tower_cookies::CookieManagerLayer;

use super::routes::{archive, auth, composer, root};
use super::trace::with_trace_layer;
use super::AppState;
#[cfg(any(test, feature = "testing"))]
use crate::MockDataDir;
use crate::{AppContext, AppContextConversionError, PersistentDataDir};

fn base() -> Router<AppState> {
    Router::new()
        .route("/", get(root::handler))
        .route("/login", get(root::login_form))
        .route("/login-init", post(auth::login_init))
        .route(
            "/login-callback",
            get(auth::login_callback_get).post(auth::login_callback_post),
        )
        .route("/verify-token", get(auth::verify_token))
}

/// Largest multipart body accepted for photo uploads.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Routes that need the `sessionid` cookie.
fn composer_router() -> Router<AppState> {
    Router::new()
        .route("/composer", get(composer::show))
        .route("/composer/media", post(composer::add_media))
        .route("/composer/media/gallery", get(archive::gallery))
        .route(
            "/composer/location",
            get(composer::search_location).post(composer::add_location),
        )
        .route("/submit", post(composer::submit))
        .route("/queryposts", get(archive::query_posts))
        .merge(upload_router())
}

fn upload_router() -> Router<AppState> {
    Router::new()
        .route("/composer/media/device", post(composer::add_photos))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Create the app
pub fn create_app(context: &AppContext) -> Router {
    let state = AppState::new(context);
    let app = base()
        .merge(composer_router())
        .layer(CookieManagerLayer::new())
        .with_state(state);

    with_trace_layer(app)
}

/// Errors that can occur when building a `AdminServer`.
#[derive(thiserror::Error, Debug)]
pub enum AdminServerBuildError {
    /// Failed to bind or run the HTTP server.
    #[error("Failed to create admin server: {0}")]
    Server(anyhow::Error),

    /// Failed to boostrap from the data directory.
    #[error("Failed to boostrap from the data directory: {0}")]
    DataDir(AppContextConversionError),
}

/// The admin HTTP server.
///
/// When dropped, the server will stop.
pub struct AdminServer {
    /// Keep context alive.
    #[allow(dead_code)]
    context: AppContext,
    http_handle: Handle<SocketAddr>,
    socket: SocketAddr,
}

impl AdminServer {
    /// Run the server with configurations from a data directory path.
    pub async fn from_data_dir_path(data_dir_path: PathBuf) -> Result<Self, AdminServerBuildError> {
        let data_dir = PersistentDataDir::new(data_dir_path);
        let context = AppContext::read_from(data_dir)
            .await
            .map_err(AdminServerBuildError::DataDir)?;
        Self::start(context).await
    }

    /// Run the server with a mock data directory.
    #[cfg(any(test, feature = "testing"))]
    pub async fn from_mock_dir(mock_dir: MockDataDir) -> Result<Self, AdminServerBuildError> {
        let context = AppContext::read_from(mock_dir)
            .await
            .map_err(AdminServerBuildError::DataDir)?;
        Self::start(context).await
    }

    /// Start serving on `general.listen_socket`.
    pub async fn start(context: AppContext) -> Result<Self, AdminServerBuildError> {
        let router = create_app(&context);

        let listener = TcpListener::bind(context.config_toml.general.listen_socket)
            .map_err(|e| AdminServerBuildError::Server(e.into()))?;
        let socket = listener
            .local_addr()
            .map_err(|e| AdminServerBuildError::Server(e.into()))?;
        listener
            .set_nonblocking(true)
            .map_err(|e| AdminServerBuildError::Server(e.into()))?;
        let http_handle = Handle::new();
        let server =
            axum_server::from_tcp(listener).map_err(|e| AdminServerBuildError::Server(e.into()))?;
        tokio::spawn(
            server
                .handle(http_handle.clone())
                .serve(router.into_make_service())
                .map_err(|error| tracing::error!(?error, "Admin server error")),
        );

        tracing::info!("Admin server listening on http://{socket}");

        Ok(Self {
            context,
            http_handle,
            socket,
        })
    }

    /// Get the socket address of the server.
    pub fn listen_socket(&self) -> SocketAddr {
        self.socket
    }

    /// Shutdown the http server.
    pub fn shutdown(&self) {
        self.http_handle
            .graceful_shutdown(Some(Duration::from_secs(5)));
    }
}

impl Drop for AdminServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
