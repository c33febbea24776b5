//!
//! Module to initialize tracing logs.
//!
//! `RUST_LOG` wins when set. Otherwise the filter is built from the `[logging]`
//! section of the config file, falling back to the defaults when the file
//! can't be read. Called before the server starts so config loading errors
//! are logged too.
//!

use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::{ConfigToml, LoggingToml, PersistentDataDir};

fn read_config_from_file(data_dir: &Path) -> anyhow::Result<ConfigToml> {
    let data_dir = PersistentDataDir::new(data_dir.to_path_buf());
    let config = ConfigToml::from_file(data_dir.get_config_file_path())?;
    Ok(config)
}

/// The filter for a `[logging]` section.
pub fn env_filter_from_config(config: &LoggingToml) -> EnvFilter {
    let mut filter = EnvFilter::new("");
    filter = filter.add_directive(config.level.to_owned().into());
    for directive in &config.module_levels {
        filter = filter.add_directive(directive.to_owned().into());
    }
    filter
}

/// Initialize tracing logger based on the values defined in the config.
pub fn init_tracing_logs_with_config(config: &ConfigToml) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| env_filter_from_config(&config.logging));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}

/// Initialize tracing logger based on the config file in `data_dir`.
/// If the config file is not found, use default values.
pub fn init_tracing_logs(data_dir: &Path) -> anyhow::Result<()> {
    let config = match read_config_from_file(data_dir) {
        Ok(config) => config,
        Err(e) => {
            println!("Failed to read config from file: {}", e);
            ConfigToml::default()
        }
    };

    init_tracing_logs_with_config(&config)
}
