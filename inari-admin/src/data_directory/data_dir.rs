use std::{fmt::Debug, path::Path};

use super::ConfigToml;

/// A directory holding the server's configuration and stored data.
///
/// [`super::PersistentDataDir`] is the real one, [`super::MockDataDir`] lives in a
/// temporary directory for tests.
pub trait DataDir: Debug + Send + Sync {
    /// Absolute path of the directory.
    fn path(&self) -> &Path;

    /// Create the directory if needed and check that it can be written to.
    fn ensure_data_dir_exists_and_is_writable(&self) -> anyhow::Result<()>;

    /// Read `config.toml`, writing the defaults first if it doesn't exist.
    fn read_or_create_config_file(&self) -> anyhow::Result<ConfigToml>;
}
