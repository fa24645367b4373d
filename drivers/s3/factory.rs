//! S3驱动工厂

use std::sync::Arc;

use super::backend::{BucketOptions, S3Backend};
use super::config::S3CompatibleConfig;
use super::driver::S3Driver;
use crate::error::{Result, UploadError};
use crate::storage::{DriverFactory, DriverType, StorageDriver};

/// S3驱动工厂
pub struct S3DriverFactory {
    config: S3CompatibleConfig,
    concurrency: usize,
}

impl S3DriverFactory {
    pub fn new(config: S3CompatibleConfig, concurrency: usize) -> Self {
        Self { config, concurrency }
    }
}

impl DriverFactory for S3DriverFactory {
    fn driver_type(&self) -> DriverType {
        DriverType::Minio
    }

    fn create_driver(&self) -> Result<Box<dyn StorageDriver>> {
        let options = BucketOptions {
            bucket_name: self.config.bucket_name.clone(),
            endpoint: self.config.endpoint_url(),
            region: self.config.region.clone(),
            access_key_id: self.config.access_key_id.clone(),
            secret_access_key: self.config.secret_access_key.clone(),
            path_style: true,
        };
        let backend = S3Backend::new(&options).map_err(|source| UploadError::Construct {
            driver: DriverType::Minio,
            source,
        })?;

        tracing::info!(
            "S3 driver initialized: endpoint={}, bucket={}",
            options.endpoint,
            options.bucket_name
        );

        Ok(Box::new(S3Driver::new(
            Arc::new(backend),
            self.config.bucket_name.clone(),
            self.config.path.clone(),
            self.config.domain.clone(),
            self.concurrency,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_scheme_follows_use_ssl() {
        let mut config = S3CompatibleConfig {
            endpoint: "127.0.0.1:9000".to_string(),
            bucket_name: "e-code".to_string(),
            ..Default::default()
        };
        assert_eq!(config.endpoint_url(), "http://127.0.0.1:9000");

        config.use_ssl = true;
        assert_eq!(config.endpoint_url(), "https://127.0.0.1:9000");

        let driver = S3DriverFactory::new(config, 2).create_driver().unwrap();
        assert_eq!(driver.driver_type(), DriverType::Minio);
    }
}
