//! MinIO / S3兼容存储驱动

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::file::UploadFile;
use crate::naming::join;
use crate::storage::{DriverType, ObjectBackend, ObjectStore, StorageDriver};
use crate::utils::check_valid_bucket_name;

/// S3-compatible driver, path-style addressing / S3兼容存储驱动
pub struct S3Driver {
    store: ObjectStore,
    bucket_name: String,
}

impl S3Driver {
    /// URLs are `domain/bucket/key` under path-style addressing
    pub fn new(
        backend: Arc<dyn ObjectBackend>,
        bucket_name: impl Into<String>,
        path: impl Into<String>,
        domain: impl Into<String>,
        concurrency: usize,
    ) -> Self {
        let bucket_name: String = bucket_name.into();
        let domain: String = domain.into();
        let url_base = join(&[domain.as_str(), bucket_name.as_str()]);
        Self {
            store: ObjectStore::new(DriverType::Minio, backend, concurrency)
                .with_prefix(path)
                .with_url_base(url_base),
            bucket_name,
        }
    }
}

#[async_trait]
impl StorageDriver for S3Driver {
    async fn upload(
        &self,
        file: &UploadFile,
        randomly: bool,
        cancel: &CancellationToken,
    ) -> Result<(String, String)> {
        check_valid_bucket_name(&self.bucket_name)?;
        self.store.upload(file, randomly, cancel).await
    }

    async fn multipart_upload(
        &self,
        file: &UploadFile,
        randomly: bool,
        part_size_mb: u64,
        cancel: &CancellationToken,
    ) -> Result<(String, String)> {
        check_valid_bucket_name(&self.bucket_name)?;
        self.store
            .multipart_upload(file, randomly, part_size_mb, cancel)
            .await
    }

    async fn delete_objects(&self, paths: &[String], cancel: &CancellationToken) -> Result<()> {
        self.store.delete_all(paths, cancel).await
    }

    fn driver_type(&self) -> DriverType {
        DriverType::Minio
    }
}
