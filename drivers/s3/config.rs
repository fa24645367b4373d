//! S3兼容存储配置

use serde::{Deserialize, Serialize};

use crate::utils::with_scheme;

/// MinIO / S3-compatible configuration / S3兼容存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3CompatibleConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Host and port, without scheme, e.g. `127.0.0.1:9000`
    pub endpoint: String,
    /// 存储桶名称
    pub bucket_name: String,
    /// Key prefix inside the bucket / 存储桶内的路径前缀
    #[serde(default)]
    pub path: String,
    /// Use https for the endpoint / 是否使用HTTPS
    #[serde(default)]
    pub use_ssl: bool,
    /// Public URL prefix / 访问域名
    #[serde(default)]
    pub domain: String,
    /// Signing region; MinIO ignores it / 区域
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for S3CompatibleConfig {
    fn default() -> Self {
        Self {
            access_key_id: String::new(),
            secret_access_key: String::new(),
            endpoint: String::new(),
            bucket_name: String::new(),
            path: String::new(),
            use_ssl: false,
            domain: String::new(),
            region: default_region(),
        }
    }
}

impl S3CompatibleConfig {
    /// Endpoint URL with scheme / 带协议的端点地址
    pub fn endpoint_url(&self) -> String {
        with_scheme(self.endpoint.trim_end_matches('/'), self.use_ssl)
    }
}
