use std::{
    io::Write,
    path::{Path, PathBuf},
};

use super::{ConfigToml, DataDir};

/// The data directory of the admin server on disk.
///
/// Paths starting with `~/` are expanded to the home directory.
#[derive(Debug, Clone)]
pub struct PersistentDataDir {
    expanded_path: PathBuf,
}

impl PersistentDataDir {
    /// Creates a new data directory.
    pub fn new(path: PathBuf) -> Self {
        Self {
            expanded_path: Self::expand_home_dir(path),
        }
    }

    fn expand_home_dir(path: PathBuf) -> PathBuf {
        let Some(as_str) = path.to_str() else {
            // Not valid utf-8, can't expand.
            return path;
        };

        if let Some(without_home) = as_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(without_home);
            }
        }
        path
    }

    /// Returns the config file path in this directory.
    pub fn get_config_file_path(&self) -> PathBuf {
        self.expanded_path.join("config.toml")
    }

    fn write_default_config_file(&self) -> anyhow::Result<()> {
        let mut config_file = std::fs::File::create(self.get_config_file_path())?;
        config_file.write_all(ConfigToml::default_string().as_bytes())?;
        Ok(())
    }
}

impl Default for PersistentDataDir {
    fn default() -> Self {
        Self::new(PathBuf::from("~/.inari"))
    }
}

impl DataDir for PersistentDataDir {
    fn path(&self) -> &Path {
        &self.expanded_path
    }

    fn ensure_data_dir_exists_and_is_writable(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.expanded_path)?;

        let probe = self.expanded_path.join(".write-test");
        std::fs::write(&probe, b"")?;
        std::fs::remove_file(probe)?;
        Ok(())
    }

    fn read_or_create_config_file(&self) -> anyhow::Result<ConfigToml> {
        let config_file_path = self.get_config_file_path();
        if !config_file_path.exists() {
            self.write_default_config_file()?;
        }
        Ok(ConfigToml::from_file(config_file_path)?)
    }
}
