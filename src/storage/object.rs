//! Upload paths shared by every object-store driver / 对象存储通用上传逻辑
//!
//! Vendor drivers differ only in how they build the backend, the key prefix
//! and the public URL base. Everything after that lives here.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::backend::ObjectBackend;
use super::multipart::MultipartUpload;
use super::DriverType;
use crate::chunk::MB;
use crate::error::{Result, UploadError};
use crate::file::UploadFile;
use crate::naming::{ext, gen_name, join};
use crate::utils::{check_valid_object_name, get_content_type};

/// A backend plus the per-driver settings needed to talk to it / 对象存储客户端
pub struct ObjectStore {
    driver: DriverType,
    backend: Arc<dyn ObjectBackend>,
    concurrency: usize,
    /// Key prefix, the `path` setting of the driver
    prefix: String,
    /// Public URL every key is joined onto
    url_base: String,
}

impl ObjectStore {
    pub fn new(driver: DriverType, backend: Arc<dyn ObjectBackend>, concurrency: usize) -> Self {
        Self {
            driver,
            backend,
            concurrency: concurrency.max(1),
            prefix: String::new(),
            url_base: String::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_url_base(mut self, url_base: impl Into<String>) -> Self {
        self.url_base = url_base.into();
        self
    }

    /// Generate and validate the object key for `file` / 生成并校验对象键
    pub fn object_key(&self, file: &UploadFile, randomly: bool) -> Result<String> {
        let key = gen_name(&self.prefix, file.name(), randomly);
        check_valid_object_name(&key)?;
        Ok(key)
    }

    pub fn file_url(&self, key: &str) -> String {
        join(&[self.url_base.as_str(), key])
    }

    /// Key, single-request put and URL in one step / 简单上传并返回路径与地址
    pub async fn upload(
        &self,
        file: &UploadFile,
        randomly: bool,
        cancel: &CancellationToken,
    ) -> Result<(String, String)> {
        let key = self.object_key(file, randomly)?;
        self.put(file, &key, cancel).await?;

        let url = self.file_url(&key);
        Ok((key, url))
    }

    /// Key, multipart session and URL in one step / 分片上传并返回路径与地址
    pub async fn multipart_upload(
        &self,
        file: &UploadFile,
        randomly: bool,
        part_size_mb: u64,
        cancel: &CancellationToken,
    ) -> Result<(String, String)> {
        let key = self.object_key(file, randomly)?;
        self.put_multipart(file, &key, part_size_mb, cancel).await?;

        let url = self.file_url(&key);
        Ok((key, url))
    }

    /// Single-request upload of `file` to `key` / 简单上传
    ///
    /// The body goes out as one request, so the whole file is buffered.
    /// Large files belong on [`ObjectStore::multipart_upload`].
    pub async fn put(
        &self,
        file: &UploadFile,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        let content_type = get_content_type(&ext(file.name()));
        let data = file.read_all().await?;

        tracing::debug!("{} put object: key={}, size={}", self.driver, key, data.len());

        tokio::select! {
            res = self.backend.put_object(key, data, &content_type) => {
                res.map_err(UploadError::Transport)
            }
            _ = cancel.cancelled() => Err(UploadError::Cancelled),
        }
    }

    /// Multipart upload of `file` to `key` / 分片上传
    pub async fn put_multipart(
        &self,
        file: &UploadFile,
        key: &str,
        part_size_mb: u64,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let content_type = get_content_type(&ext(file.name()));

        MultipartUpload::new(self.backend.as_ref(), key, content_type)
            .with_concurrency(self.concurrency)
            .run(file, part_size_mb.saturating_mul(MB), cancel)
            .await
    }

    /// Delete every key, collecting the ones that failed / 批量删除
    pub async fn delete_all(&self, keys: &[String], cancel: &CancellationToken) -> Result<()> {
        let mut failed = Vec::new();

        for key in keys {
            if cancel.is_cancelled() {
                return Err(UploadError::Cancelled);
            }
            if let Err(e) = self.backend.delete_object(key).await {
                tracing::warn!("{} delete failed: {} - {}", self.driver, key, e);
                failed.push(key.clone());
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(UploadError::Delete { paths: failed })
        }
    }
}
