use std::path::Path;

use opendal::Operator;
use serde::{Deserialize, Serialize};

/// Where session documents are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageConfigToml {
    /// Files under `<data_dir>/data`.
    #[default]
    FileSystem,
    /// Process memory. Sessions are lost on restart.
    InMemory,
}

impl StorageConfigToml {
    /// Build the opendal operator for this backend.
    pub fn build_operator(&self, data_dir: &Path) -> Result<Operator, opendal::Error> {
        let operator = match self {
            StorageConfigToml::FileSystem => {
                let root = data_dir.join("data");
                let builder = opendal::services::Fs::default().root(&root.to_string_lossy());
                Operator::new(builder)?.finish()
            }
            StorageConfigToml::InMemory => {
                let builder = opendal::services::Memory::default();
                Operator::new(builder)?.finish()
            }
        };
        Ok(operator)
    }
}
