use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{Result, UploadError};
use crate::file::UploadFile;

/// Backend variant tag / 存储驱动类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriverType {
    /// Local disk / 本地存储
    Local,
    /// MinIO and other S3-compatible stores / S3兼容存储
    #[serde(alias = "S3Compatible")]
    Minio,
    /// 阿里云OSS
    #[serde(alias = "AliyunOSS")]
    AliyunOss,
    /// 腾讯云COS
    #[serde(alias = "TencentCOS")]
    TencentCos,
    /// 华为云OBS
    #[serde(alias = "HuaweiOBS")]
    HuaweiObs,
    /// 七牛云
    Qiniu,
}

impl DriverType {
    pub const ALL: [DriverType; 6] = [
        DriverType::Local,
        DriverType::Minio,
        DriverType::AliyunOss,
        DriverType::TencentCos,
        DriverType::HuaweiObs,
        DriverType::Qiniu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DriverType::Local => "Local",
            DriverType::Minio => "Minio",
            DriverType::AliyunOss => "AliyunOss",
            DriverType::TencentCos => "TencentCos",
            DriverType::HuaweiObs => "HuaweiObs",
            DriverType::Qiniu => "Qiniu",
        }
    }
}

impl fmt::Display for DriverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverType {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "S3Compatible" => Ok(DriverType::Minio),
            "AliyunOSS" => Ok(DriverType::AliyunOss),
            "TencentCOS" => Ok(DriverType::TencentCos),
            "HuaweiOBS" => Ok(DriverType::HuaweiObs),
            _ => DriverType::ALL
                .into_iter()
                .find(|t| t.as_str() == s)
                .ok_or_else(|| UploadError::UnknownDriverType(s.to_string())),
        }
    }
}

/// Storage driver interface (write path only) / 存储驱动接口
///
/// Every call takes a cancellation token; a cancelled upload cleans up its
/// partial artifacts before returning [`UploadError::Cancelled`].
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Single-shot upload, returns `(path, url)` / 整体上传
    async fn upload(
        &self,
        file: &UploadFile,
        randomly: bool,
        cancel: &CancellationToken,
    ) -> Result<(String, String)>;

    /// Multipart upload with `part_size_mb` MB parts, returns `(path, url)` / 分片上传
    async fn multipart_upload(
        &self,
        file: &UploadFile,
        randomly: bool,
        part_size_mb: u64,
        cancel: &CancellationToken,
    ) -> Result<(String, String)>;

    /// Best-effort batch delete; every path is attempted / 批量删除
    async fn delete_objects(&self, paths: &[String], cancel: &CancellationToken) -> Result<()>;

    /// Driver type tag / 驱动类型
    fn driver_type(&self) -> DriverType;
}

pub mod backend;
pub mod manager;
pub mod multipart;
pub mod object;
#[cfg(test)]
pub(crate) mod testing;

pub use backend::{CompletedPart, ObjectBackend};
pub use manager::{DriverBox, DriverFactory, DriverRegistry};
pub use multipart::MultipartUpload;
pub use object::ObjectStore;
