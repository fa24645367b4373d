//! Huawei OBS driver / 华为云OBS驱动

mod driver;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::drivers::s3::{BucketOptions, S3Backend};
use crate::error::{Result, UploadError};
use crate::storage::{DriverFactory, DriverType, StorageDriver};
use crate::utils::with_scheme;

pub use driver::ObsDriver;

/// 华为云OBS配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObsConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    /// e.g. `obs.cn-north-4.myhuaweicloud.com`
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

impl ObsConfig {
    /// `obs.cn-north-4.myhuaweicloud.com` → `cn-north-4`
    pub fn resolved_region(&self) -> String {
        if !self.region.is_empty() {
            return self.region.clone();
        }
        let host = self
            .endpoint
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        let mut labels = host.split('.');
        match (labels.next(), labels.next()) {
            (Some("obs"), Some(region)) => region.to_string(),
            _ => String::new(),
        }
    }
}

pub struct ObsDriverFactory {
    config: ObsConfig,
    concurrency: usize,
}

impl ObsDriverFactory {
    pub fn new(config: ObsConfig, concurrency: usize) -> Self {
        Self { config, concurrency }
    }
}

impl DriverFactory for ObsDriverFactory {
    fn driver_type(&self) -> DriverType {
        DriverType::HuaweiObs
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
            driver: DriverType::HuaweiObs,
            source,
        })?;

        tracing::info!(
            "OBS driver initialized: endpoint={}, bucket={}",
            options.endpoint,
            options.bucket_name
        );

        Ok(Box::new(ObsDriver::new(
            Arc::new(backend),
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
    fn test_region_from_endpoint() {
        let config = ObsConfig {
            endpoint: "obs.cn-north-4.myhuaweicloud.com".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolved_region(), "cn-north-4");

        let config = ObsConfig {
            endpoint: "storage.example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolved_region(), "");
    }
}
