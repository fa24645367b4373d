//! Local disk driver / 本地存储驱动

mod driver;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, UploadError};
use crate::storage::{DriverFactory, DriverType, StorageDriver};

pub use driver::LocalDriver;

/// Local storage configuration / 本地存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Root directory files are saved under / 文件保存根目录
    pub local_path: String,
    /// Public URL prefix / 访问域名
    #[serde(default)]
    pub domain: String,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            local_path: "attachment".to_string(),
            domain: "http://localhost".to_string(),
        }
    }
}

pub struct LocalDriverFactory {
    config: LocalConfig,
}

impl LocalDriverFactory {
    pub fn new(config: LocalConfig) -> Self {
        Self { config }
    }
}

impl DriverFactory for LocalDriverFactory {
    fn driver_type(&self) -> DriverType {
        DriverType::Local
    }

    fn create_driver(&self) -> Result<Box<dyn StorageDriver>> {
        let trimmed = self.config.local_path.trim_end_matches(['/', '\\', ' ']);
        let root = if trimmed.is_empty() && !self.config.local_path.is_empty() {
            PathBuf::from("/")
        } else {
            PathBuf::from(trimmed)
        };

        if !root.exists() {
            std::fs::create_dir_all(&root).map_err(|source| UploadError::DirectoryCreate {
                path: root.clone(),
                source,
            })?;
        } else if !root.is_dir() {
            return Err(UploadError::NotADirectory(root));
        }

        let canonical_root = root.canonicalize().map_err(|e| UploadError::Construct {
            driver: DriverType::Local,
            source: Box::new(e),
        })?;

        tracing::info!("Local driver initialized, root: {:?}", canonical_root);

        Ok(Box::new(LocalDriver::new(canonical_root, self.config.domain.clone())))
    }
}
