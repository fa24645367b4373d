//! Tencent COS driver / 腾讯云COS驱动

mod driver;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::drivers::s3::{BucketOptions, S3Backend};
use crate::error::{Result, UploadError};
use crate::storage::{DriverFactory, DriverType, StorageDriver};
use crate::utils::with_scheme;

pub use driver::CosDriver;

/// 腾讯云COS配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CosConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Bucket name including the APPID suffix, e.g. `examplebucket-1250000000`
    pub bucket_name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub domain: String,
    /// e.g. `ap-guangzhou` / 地域
    pub region: String,
    /// Overrides `cos.{region}.myqcloud.com` / 自定义端点
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl CosConfig {
    pub fn endpoint_url(&self) -> String {
        match self.endpoint.as_deref() {
            Some(endpoint) if !endpoint.is_empty() => with_scheme(endpoint, true),
            _ => format!("https://cos.{}.myqcloud.com", self.region),
        }
    }
}

pub struct CosDriverFactory {
    config: CosConfig,
    concurrency: usize,
}

impl CosDriverFactory {
    pub fn new(config: CosConfig, concurrency: usize) -> Self {
        Self { config, concurrency }
    }
}

impl DriverFactory for CosDriverFactory {
    fn driver_type(&self) -> DriverType {
        DriverType::TencentCos
    }

    fn create_driver(&self) -> Result<Box<dyn StorageDriver>> {
        let options = BucketOptions {
            bucket_name: self.config.bucket_name.clone(),
            endpoint: self.config.endpoint_url(),
            region: self.config.region.clone(),
            access_key_id: self.config.access_key_id.clone(),
            secret_access_key: self.config.secret_access_key.clone(),
            path_style: false,
        };
        let backend = S3Backend::new(&options).map_err(|source| UploadError::Construct {
            driver: DriverType::TencentCos,
            source,
        })?;

        tracing::info!(
            "COS driver initialized: endpoint={}, bucket={}",
            options.endpoint,
            options.bucket_name
        );

        Ok(Box::new(CosDriver::new(
            Arc::new(backend),
            self.config.path.clone(),
            self.config.domain.clone(),
            self.concurrency,
        )))
    }
}
