//! Qiniu Kodo driver / 七牛云存储驱动
//!
//! Uses the Kodo S3-compatible endpoint `s3.{region}.qiniucs.com`.

mod driver;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::drivers::s3::{BucketOptions, S3Backend};
use crate::error::{Result, UploadError};
use crate::storage::{DriverFactory, DriverType, StorageDriver};

pub use driver::QiniuDriver;

/// 七牛云配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QiniuConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket_name: String,
    #[serde(default)]
    pub path: String,
    /// Bound domain, scheme optional / 绑定域名
    #[serde(default)]
    pub domain: String,
    /// Region id, e.g. `cn-east-1` / 存储区域
    pub region: String,
    #[serde(default = "default_use_ssl")]
    pub use_ssl: bool,
}

fn default_use_ssl() -> bool {
    true
}

impl Default for QiniuConfig {
    fn default() -> Self {
        Self {
            access_key_id: String::new(),
            secret_access_key: String::new(),
            bucket_name: String::new(),
            path: String::new(),
            domain: String::new(),
            region: String::new(),
            use_ssl: default_use_ssl(),
        }
    }
}

impl QiniuConfig {
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://s3.{}.qiniucs.com", scheme, self.region)
    }
}

pub struct QiniuDriverFactory {
    config: QiniuConfig,
    concurrency: usize,
}

impl QiniuDriverFactory {
    pub fn new(config: QiniuConfig, concurrency: usize) -> Self {
        Self { config, concurrency }
    }
}

impl DriverFactory for QiniuDriverFactory {
    fn driver_type(&self) -> DriverType {
        DriverType::Qiniu
    }

    fn create_driver(&self) -> Result<Box<dyn StorageDriver>> {
        if self.config.region.is_empty() {
            return Err(UploadError::Construct {
                driver: DriverType::Qiniu,
                source: "qiniu region is required".into(),
            });
        }

        let options = BucketOptions {
            bucket_name: self.config.bucket_name.clone(),
            endpoint: self.config.endpoint_url(),
            region: self.config.region.clone(),
            access_key_id: self.config.access_key_id.clone(),
            secret_access_key: self.config.secret_access_key.clone(),
            path_style: false,
        };
        let backend = S3Backend::new(&options).map_err(|source| UploadError::Construct {
            driver: DriverType::Qiniu,
            source,
        })?;

        tracing::info!(
            "Qiniu driver initialized: endpoint={}, bucket={}",
            options.endpoint,
            options.bucket_name
        );

        Ok(Box::new(QiniuDriver::new(
            Arc::new(backend),
            self.config.path.clone(),
            &self.config.domain,
            self.config.use_ssl,
            self.concurrency,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_endpoint_follows_use_ssl() {
        let mut config = QiniuConfig {
            region: "cn-east-1".to_string(),
            ..Default::default()
        };
        assert_eq!(config.endpoint_url(), "https://s3.cn-east-1.qiniucs.com");

        config.use_ssl = false;
        assert_eq!(config.endpoint_url(), "http://s3.cn-east-1.qiniucs.com");
    }

    #[test]
    fn test_missing_region_is_construct_error() {
        let factory = QiniuDriverFactory::new(QiniuConfig::default(), 1);
        let err = factory.create_driver().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Construct);
    }

    #[test]
    fn test_factory_builds_driver_with_region() {
        let config = QiniuConfig {
            access_key_id: "ak".to_string(),
            secret_access_key: "sk".to_string(),
            bucket_name: "images".to_string(),
            domain: "cdn.example.com".to_string(),
            region: "cn-east-1".to_string(),
            ..Default::default()
        };
        let driver = QiniuDriverFactory::new(config, 2).create_driver().unwrap();
        assert_eq!(driver.driver_type(), DriverType::Qiniu);
    }
}
