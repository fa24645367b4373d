// Driver package / 驱动包
pub mod local;
pub mod s3;
pub mod oss;
pub mod cos;
pub mod obs;
pub mod qiniu;

use crate::config::StorageConfig;
use crate::storage::DriverRegistry;

/// Register a factory for every backend section in the config / 注册所有已配置的驱动
pub fn register_all(registry: &mut DriverRegistry, config: &StorageConfig) {
    let concurrency = config.part_concurrency;

    // Register local driver / 注册本地驱动
    if let Some(local) = &config.local {
        registry.register_factory(Box::new(local::LocalDriverFactory::new(local.clone())));
    }
    // Register MinIO / S3-compatible driver / 注册S3兼容存储驱动
    if let Some(minio) = &config.minio {
        registry.register_factory(Box::new(s3::S3DriverFactory::new(minio.clone(), concurrency)));
    }
    // Register Aliyun OSS driver / 注册阿里云OSS驱动
    if let Some(oss) = &config.oss {
        registry.register_factory(Box::new(oss::OssDriverFactory::new(oss.clone(), concurrency)));
    }
    // Register Tencent COS driver / 注册腾讯云COS驱动
    if let Some(cos) = &config.cos {
        registry.register_factory(Box::new(cos::CosDriverFactory::new(cos.clone(), concurrency)));
    }
    // Register Huawei OBS driver / 注册华为云OBS驱动
    if let Some(obs) = &config.obs {
        registry.register_factory(Box::new(obs::ObsDriverFactory::new(obs.clone(), concurrency)));
    }
    // Register Qiniu driver / 注册七牛云驱动
    if let Some(qiniu) = &config.qiniu {
        let factory = qiniu::QiniuDriverFactory::new(qiniu.clone(), concurrency);
        registry.register_factory(Box::new(factory));
    }
}
