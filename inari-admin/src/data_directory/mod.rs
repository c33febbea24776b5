//! Data directory and configuration file.

mod config_toml;
mod data_dir;
mod log_level;
#[cfg(any(test, feature = "testing"))]
mod mock_data_dir;
mod persistent_data_dir;
mod storage_config;

pub use config_toml::{
    ConfigReadError, ConfigToml, GeneralToml, GeocoderToml, HttpToml, IndieAuthToml, LoggingToml,
    DEFAULT_CONFIG,
};
pub use data_dir::DataDir;
pub use log_level::{LogLevel, TargetLevel};
#[cfg(any(test, feature = "testing"))]
pub use mock_data_dir::MockDataDir;
pub use persistent_data_dir::PersistentDataDir;
pub use storage_config::StorageConfigToml;
