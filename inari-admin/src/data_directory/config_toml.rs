//! Configuration file for the admin server.
//!
//! All default values live exclusively in `config.default.toml`.
//! This module embeds that file at compile-time and lets callers layer their
//! own TOML on top.

use super::{
    log_level::{LogLevel, TargetLevel},
    storage_config::StorageConfigToml,
};
use serde::{Deserialize, Serialize};
use std::{
    fmt::Debug, fs, net::SocketAddr, num::NonZeroU64, path::Path, str::FromStr, time::Duration,
};

/// Embedded copy of the default configuration.
pub const DEFAULT_CONFIG: &str = include_str!("config.default.toml");

/// Error that can occur when reading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigReadError {
    /// The file did not exist or could not be read.
    #[error("config file not found: {0}")]
    ConfigFileNotFound(#[from] std::io::Error),
    /// The TOML was syntactically invalid.
    #[error("config file is not valid TOML: {0}")]
    ConfigFileNotValid(#[from] toml::de::Error),
    /// Failed to merge defaults with overrides.
    #[error("failed to merge embedded and user TOML: {0}")]
    ConfigMergeError(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeneralToml {
    pub listen_socket: SocketAddr,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IndieAuthToml {
    /// Sent as `client_id` to the authorization and token endpoints.
    pub client_id: String,
    /// Sent as `redirect_uri` to the authorization and token endpoints.
    pub redirect_uri: String,
    /// Token endpoint used to verify bearer tokens.
    pub token_endpoint: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HttpToml {
    /// Zero is rejected, it would fail every outbound call.
    pub request_timeout_ms: NonZeroU64,
}

impl HttpToml {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.get())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeocoderToml {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LoggingToml {
    pub level: LogLevel,
    pub module_levels: Vec<TargetLevel>,
}

/// The overall application configuration.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConfigToml {
    /// Listen socket.
    pub general: GeneralToml,
    /// This application's IndieAuth identity.
    pub indieauth: IndieAuthToml,
    /// Outbound HTTP settings.
    pub http: HttpToml,
    /// Address lookup for the location picker.
    pub geocoder: GeocoderToml,
    /// Session storage backend.
    pub storage: StorageConfigToml,
    /// Log levels, used unless `RUST_LOG` is set.
    pub logging: LoggingToml,
}

impl Default for ConfigToml {
    fn default() -> Self {
        ConfigToml::from_str(DEFAULT_CONFIG).expect("Embedded config.default.toml must be valid")
    }
}

impl ConfigToml {
    /// Read and parse a configuration file, overlaying it on top of the embedded defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigReadError> {
        let raw = fs::read_to_string(path)?;
        Self::from_str_with_defaults(&raw)
    }

    /// Parse a raw TOML string, overlaying it on top of the embedded defaults.
    pub fn from_str_with_defaults(raw: &str) -> Result<Self, ConfigReadError> {
        let default_val: toml::Value = DEFAULT_CONFIG
            .parse()
            .expect("embedded defaults invalid TOML");
        let user_val: toml::Value = raw.parse()?;

        let merged_val = serde_toml_merge::merge(default_val, user_val)
            .map_err(|e| ConfigReadError::ConfigMergeError(e.to_string()))?;

        Ok(merged_val.try_into()?)
    }

    /// The embedded defaults, written to new data directories.
    pub fn default_string() -> String {
        DEFAULT_CONFIG.to_string()
    }

    /// Returns a default config tuned for unit tests.
    pub fn test() -> Self {
        let mut config = Self::default();
        // Ephemeral port so parallel tests don't collide.
        config.general.listen_socket = SocketAddr::from(([127, 0, 0, 1], 0));
        config.indieauth.client_id = "https://admin.example/".to_string();
        config.indieauth.redirect_uri = "https://admin.example/login-callback".to_string();
        config.http.request_timeout_ms = NonZeroU64::new(5_000).expect("non-zero literal");
        config.storage = StorageConfigToml::InMemory;
        config
    }
}

impl FromStr for ConfigToml {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}
