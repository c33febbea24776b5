//!
//! The application context shared between all components.
//! Think of it as a simple Dependency Injection container.
//!
//! Create with a `DataDir` instance: `AppContext::read_from(data_dir)`
//!

use std::sync::Arc;

use inari_micropub::{BuildError, HttpMicropubClient, MicropubClient};

#[cfg(any(test, feature = "testing"))]
use crate::MockDataDir;
use crate::{
    archive::Archive,
    composer::Composer,
    discovery::EndpointDiscovery,
    geocoder::{Geocoder, GoogleGeocoder},
    indieauth::IndieAuthClient,
    persistence::{OpendalSessionStore, SessionLocks, SessionStore},
    ConfigToml, DataDir,
};

/// Errors that can occur when converting a `DataDir` to an `AppContext`.
#[derive(Debug, thiserror::Error)]
pub enum AppContextConversionError {
    /// Failed to ensure data directory exists and is writable.
    #[error("Failed to ensure data directory exists and is writable: {0}")]
    DataDir(anyhow::Error),
    /// Failed to read or create config file.
    #[error("Failed to read or create config file: {0}")]
    Config(anyhow::Error),
    /// Failed to build storage operator.
    #[error("Failed to build storage operator: {0}")]
    Storage(opendal::Error),
    /// Failed to build the outbound HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(BuildError),
    /// Failed to set up the geocoder.
    #[error("Failed to set up geocoder: {0}")]
    Geocoder(anyhow::Error),
}

/// The application context shared between all components.
/// Think of it as a simple Dependency Injection container.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub(crate) config_toml: ConfigToml,
    /// Keep data_dir alive. The mock dir will cleanup on drop.
    pub(crate) data_dir: Arc<dyn DataDir>,
    pub(crate) session_store: Arc<dyn SessionStore>,
    /// Shared by every component that writes sessions.
    pub(crate) session_locks: SessionLocks,
    /// Shared client with the configured timeout and user agent.
    pub(crate) http: reqwest::Client,
    pub(crate) micropub: Arc<dyn MicropubClient>,
    pub(crate) geocoder: Arc<dyn Geocoder>,
}

impl AppContext {
    /// Create a new AppContext for testing.
    #[cfg(any(test, feature = "testing"))]
    pub async fn test() -> Self {
        let data_dir = MockDataDir::test();
        Self::read_from(data_dir)
            .await
            .expect("failed to build AppContext from MockDataDir")
    }

    /// Create a new AppContext from a data directory.
    pub async fn read_from<D: DataDir + 'static>(dir: D) -> Result<Self, AppContextConversionError> {
        dir.ensure_data_dir_exists_and_is_writable()
            .map_err(AppContextConversionError::DataDir)?;
        let conf = dir
            .read_or_create_config_file()
            .map_err(AppContextConversionError::Config)?;

        let operator = conf
            .storage
            .build_operator(dir.path())
            .map_err(AppContextConversionError::Storage)?;

        let micropub = HttpMicropubClient::builder()
            .request_timeout(conf.http.request_timeout())
            .build()
            .map_err(AppContextConversionError::HttpClient)?;
        let http = micropub.http().clone();

        let geocoder = GoogleGeocoder::from_config(http.clone(), &conf.geocoder)
            .map_err(AppContextConversionError::Geocoder)?;

        Ok(Self {
            session_store: Arc::new(OpendalSessionStore::new(operator)),
            session_locks: SessionLocks::new(),
            micropub: Arc::new(micropub),
            http,
            geocoder,
            config_toml: conf,
            data_dir: Arc::new(dir),
        })
    }

    pub(crate) fn indieauth(&self) -> IndieAuthClient {
        IndieAuthClient::new(
            self.http.clone(),
            EndpointDiscovery::new(self.http.clone(), self.micropub.clone()),
            self.session_store.clone(),
            self.session_locks.clone(),
            self.config_toml.indieauth.token_endpoint.clone(),
        )
    }

    pub(crate) fn composer(&self) -> Composer {
        Composer::new(
            self.session_store.clone(),
            self.session_locks.clone(),
            self.micropub.clone(),
        )
    }

    pub(crate) fn archive(&self) -> Archive {
        Archive::new(self.micropub.clone())
    }
}
