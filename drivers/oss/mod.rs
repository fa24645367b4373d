//! Aliyun OSS driver / 阿里云OSS驱动
//!
//! Talks to OSS through its S3-compatible API with virtual-host addressing.

mod driver;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::drivers::s3::{BucketOptions, S3Backend};
use crate::error::{Result, UploadError};
use crate::storage::{DriverFactory, DriverType, StorageDriver};
use crate::utils::with_scheme;

pub use driver::OssDriver;

/// 阿里云OSS配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OssConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    /// e.g. `oss-cn-hangzhou.aliyuncs.com`
    pub endpoint: String,
    pub bucket_name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub domain: String,
    /// Signing region, derived from the endpoint when empty / 区域
    #[serde(default)]
    pub region: String,
}

impl OssConfig {
    /// `oss-cn-hangzhou.aliyuncs.com` → `cn-hangzhou`
    pub fn resolved_region(&self) -> String {
        if !self.region.is_empty() {
            return self.region.clone();
        }
        let host = self
            .endpoint
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        let label = host.split('.').next().unwrap_or_default();
        label
            .trim_start_matches("oss-")
            .trim_end_matches("-internal")
            .to_string()
    }
}

pub struct OssDriverFactory {
    config: OssConfig,
    concurrency: usize,
}

impl OssDriverFactory {
    pub fn new(config: OssConfig, concurrency: usize) -> Self {
        Self { config, concurrency }
    }
}

impl DriverFactory for OssDriverFactory {
    fn driver_type(&self) -> DriverType {
        DriverType::AliyunOss
    }

    fn create_driver(&self) -> Result<Box<dyn StorageDriver>> {
        let options = BucketOptions {
            bucket_name: self.config.bucket_name.clone(),
            endpoint: with_scheme(&self.config.endpoint, true),
            region: self.config.resolved_region(),
            access_key_id: self.config.access_key_id.clone(),
            secret_access_key: self.config.secret_access_key.clone(),
            path_style: false,
        };
        let backend = S3Backend::new(&options).map_err(|source| UploadError::Construct {
            driver: DriverType::AliyunOss,
            source,
        })?;

        tracing::info!(
            "OSS driver initialized: endpoint={}, bucket={}",
            options.endpoint,
            options.bucket_name
        );

        Ok(Box::new(OssDriver::new(
            Arc::new(backend),
            self.config.path.clone(),
            self.config.domain.clone(),
            self.concurrency,
        )))
    }
}
