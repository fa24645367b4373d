use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::file::UploadFile;
use crate::storage::{DriverType, ObjectBackend, ObjectStore, StorageDriver};

/// Tencent COS driver / 腾讯云COS驱动
pub struct CosDriver {
    store: ObjectStore,
}

impl CosDriver {
    /// `domain` is the public URL base; keys are not prefixed with the bucket
    pub fn new(
        backend: Arc<dyn ObjectBackend>,
        path: impl Into<String>,
        domain: impl Into<String>,
        concurrency: usize,
    ) -> Self {
        Self {
            store: ObjectStore::new(DriverType::TencentCos, backend, concurrency)
                .with_prefix(path)
                .with_url_base(domain),
        }
    }
}

#[async_trait]
impl StorageDriver for CosDriver {
    async fn upload(
        &self,
        file: &UploadFile,
        randomly: bool,
        cancel: &CancellationToken,
    ) -> Result<(String, String)> {
        self.store.upload(file, randomly, cancel).await
    }

    async fn multipart_upload(
        &self,
        file: &UploadFile,
        randomly: bool,
        part_size_mb: u64,
        cancel: &CancellationToken,
    ) -> Result<(String, String)> {
        self.store
            .multipart_upload(file, randomly, part_size_mb, cancel)
            .await
    }

    async fn delete_objects(&self, paths: &[String], cancel: &CancellationToken) -> Result<()> {
        self.store.delete_all(paths, cancel).await
    }

    fn driver_type(&self) -> DriverType {
        DriverType::TencentCos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::naming::gen_name;
    use crate::storage::testing::{Call, MemoryBackend};

    #[tokio::test]
    async fn test_multipart_complete_failure_does_not_abort() {
        let backend = Arc::new(MemoryBackend {
            fail_complete: true,
            ..Default::default()
        });
        let driver = CosDriver::new(backend.clone(), "cos", "https://cdn.example.com", 1);

        let err = driver
            .multipart_upload(
                &UploadFile::from_bytes("a.bin", vec![1u8; 10]),
                false,
                1,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Complete);
        assert_eq!(backend.count(|c| matches!(c, Call::Abort(_))), 0);
    }

    #[tokio::test]
    async fn test_upload_key_and_url() {
        let backend = Arc::new(MemoryBackend::default());
        let driver = CosDriver::new(backend.clone(), "", "https://cdn.example.com/", 1);

        let (path, url) = driver
            .upload(
                &UploadFile::from_bytes("a.png", &b"x"[..]),
                false,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(path, gen_name("", "a.png", false));
        assert_eq!(url, format!("https://cdn.example.com/{}", path));
        assert_eq!(backend.count(|c| matches!(c, Call::Put(_))), 1);
    }
}
