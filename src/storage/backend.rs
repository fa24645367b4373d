//! Object store transport seam / 对象存储传输接口
//!
//! Cloud drivers speak to their store only through this trait. The
//! production implementation lives in `drivers::s3::S3Backend`.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BackendError;

/// A transmitted part, needed to finalize the object / 已上传分片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    pub part_number: u32,
    pub etag: String,
}

#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Put a whole object / 上传完整对象
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), BackendError>;

    /// Start a multipart session, returns the upload id / 初始化分片上传
    async fn initiate_multipart(&self, key: &str, content_type: &str)
        -> Result<String, BackendError>;

    /// Transmit one part, returns its ETag / 上传分片
    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, BackendError>;

    /// Assemble the object from its parts / 完成分片上传
    async fn complete_multipart(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<(), BackendError>;

    /// Cancel a session server-side / 取消分片上传
    async fn abort_multipart(&self, key: &str, upload_id: &str) -> Result<(), BackendError>;

    /// Delete one object / 删除对象
    async fn delete_object(&self, key: &str) -> Result<(), BackendError>;
}
