//! Storage configuration / 存储配置
//!
//! Loaded from `config.json`. A default config (local storage under
//! `attachment`) is written on first run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::drivers::cos::CosConfig;
use crate::drivers::local::LocalConfig;
use crate::drivers::obs::ObsConfig;
use crate::drivers::oss::OssConfig;
use crate::drivers::qiniu::QiniuConfig;
use crate::drivers::s3::S3CompatibleConfig;
use crate::logging::LogConfig;
use crate::storage::DriverType;

/// Storage configuration / 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Driver used when none is requested explicitly / 默认驱动
    #[serde(default = "default_driver")]
    pub default_driver: DriverType,
    /// Parts in flight per multipart upload (1 = sequential) / 分片并发数
    #[serde(default = "default_part_concurrency")]
    pub part_concurrency: usize,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<LocalConfig>,
    /// MinIO / S3兼容存储
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minio: Option<S3CompatibleConfig>,
    /// 阿里云OSS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oss: Option<OssConfig>,
    /// 腾讯云COS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cos: Option<CosConfig>,
    /// 华为云OBS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obs: Option<ObsConfig>,
    /// 七牛云
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qiniu: Option<QiniuConfig>,
}

fn default_driver() -> DriverType {
    DriverType::Local
}

fn default_part_concurrency() -> usize {
    1
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            default_driver: default_driver(),
            part_concurrency: default_part_concurrency(),
            log: LogConfig::default(),
            local: Some(LocalConfig::default()),
            minio: None,
            oss: None,
            cos: None,
            obs: None,
            qiniu: None,
        }
    }
}

/// Default config file path / 获取配置文件路径
pub fn default_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists
/// 加载配置文件，不存在则创建默认配置
pub fn load_config(path: &Path) -> Result<StorageConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let config: StorageConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    } else {
        let config = StorageConfig::default();
        save_config(&config, path)?;
        tracing::info!("Created default configuration at {:?}", path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(config: &StorageConfig, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(config).context("Failed to serialize config")?;

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file {:?}", path))?;

    Ok(())
}
