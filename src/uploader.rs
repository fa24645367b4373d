//! Uploader facade / 上传门面
//!
//! Wraps one driver, logs failures once in a uniform shape and builds the
//! [`UploadResult`] handed back to callers.

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::file::UploadFile;
use crate::naming::ext;
use crate::storage::DriverBox;
use crate::utils::file_size;

/// Upload result / 上传结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub driver: String,
    pub file_name: String,
    pub path: String,
    /// Human-readable size, e.g. `25.00MB`
    pub size: String,
    pub file_url: String,
    pub ext: String,
}

pub struct FileUploader {
    driver: DriverBox,
    app_name: String,
}

impl FileUploader {
    pub fn new(driver: DriverBox) -> Self {
        Self {
            driver,
            app_name: "file-storage".to_string(),
        }
    }

    /// Application name attached to failure logs / 设置应用名
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub async fn upload(
        &self,
        file: &UploadFile,
        randomly: bool,
        cancel: &CancellationToken,
    ) -> Result<UploadResult> {
        match self.driver.upload(file, randomly, cancel).await {
            Ok((path, file_url)) => Ok(self.result(file, path, file_url)),
            Err(e) => {
                tracing::error!(
                    app = %self.app_name,
                    driver = %self.driver.driver_type(),
                    file = %file.name(),
                    "上传失败: {}",
                    e
                );
                Err(e)
            }
        }
    }

    pub async fn multipart_upload(
        &self,
        file: &UploadFile,
        randomly: bool,
        part_size_mb: u64,
        cancel: &CancellationToken,
    ) -> Result<UploadResult> {
        match self.driver.multipart_upload(file, randomly, part_size_mb, cancel).await {
            Ok((path, file_url)) => Ok(self.result(file, path, file_url)),
            Err(e) => {
                tracing::error!(
                    app = %self.app_name,
                    driver = %self.driver.driver_type(),
                    file = %file.name(),
                    "分片上传失败: {}",
                    e
                );
                Err(e)
            }
        }
    }

    pub async fn delete_objects(&self, paths: &[String], cancel: &CancellationToken) -> Result<()> {
        self.driver.delete_objects(paths, cancel).await.map_err(|e| {
            tracing::error!(
                app = %self.app_name,
                driver = %self.driver.driver_type(),
                "删除失败: {}",
                e
            );
            e
        })
    }

    fn result(&self, file: &UploadFile, path: String, file_url: String) -> UploadResult {
        UploadResult {
            driver: self.driver.driver_type().to_string(),
            file_name: file.name().to_string(),
            path,
            size: file_size(file.size()),
            file_url,
            ext: ext(file.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::chunk::MB;
    use crate::drivers::local::LocalDriver;
    use crate::drivers::s3::S3Driver;
    use crate::error::ErrorKind;
    use crate::naming::date_partition;
    use crate::storage::testing::{Call, MemoryBackend};

    #[tokio::test]
    async fn test_multipart_end_to_end() {
        let backend = Arc::new(MemoryBackend::default());
        let driver = Arc::new(S3Driver::new(
            backend.clone(),
            "e-code",
            "test",
            "http://127.0.0.1:9000",
            1,
        ));
        let uploader = FileUploader::new(driver).with_app_name("demo");

        let file = UploadFile::from_bytes("movie.mp4", vec![0u8; (25 * MB) as usize]);
        let result = uploader
            .multipart_upload(&file, false, 10, &CancellationToken::new())
            .await
            .unwrap();

        let path = format!("test/{}/movie.mp4", date_partition());
        assert_eq!(
            result,
            UploadResult {
                driver: "Minio".to_string(),
                file_name: "movie.mp4".to_string(),
                path: path.clone(),
                size: "25.00MB".to_string(),
                file_url: format!("http://127.0.0.1:9000/e-code/{}", path),
                ext: ".mp4".to_string(),
            }
        );
        assert_eq!(
            backend.part_sizes(),
            vec![(1, (10 * MB) as usize), (2, (10 * MB) as usize), (3, (5 * MB) as usize)]
        );
    }

    #[tokio::test]
    async fn test_local_upload_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let driver = Arc::new(LocalDriver::new(
            dir.path().to_path_buf(),
            "http://localhost".to_string(),
        ));
        let uploader = FileUploader::new(driver);
        let cancel = CancellationToken::new();

        let result = uploader
            .upload(&UploadFile::from_bytes("notes.txt", &b"hello"[..]), false, &cancel)
            .await
            .unwrap();
        assert_eq!(result.driver, "Local");
        assert_eq!(result.size, "5.00B");
        assert_eq!(result.ext, ".txt");
        assert!(dir.path().join(&result.path).is_file());

        uploader.delete_objects(&[result.path.clone()], &cancel).await.unwrap();
        assert!(!dir.path().join(&result.path).exists());
    }

    #[tokio::test]
    async fn test_failure_returned_unchanged() {
        let backend = Arc::new(MemoryBackend {
            fail_part: Some(1),
            ..Default::default()
        });
        let driver = Arc::new(S3Driver::new(backend.clone(), "e-code", "", "", 1));
        let uploader = FileUploader::new(driver);

        let file = UploadFile::from_bytes("a.bin", vec![1u8; 8]);
        let err = uploader
            .multipart_upload(&file, false, 1, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PartUpload);
        assert_eq!(backend.count(|c| matches!(c, Call::Abort(_))), 1);
    }
}
