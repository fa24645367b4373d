use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::file::UploadFile;
use crate::storage::{DriverType, ObjectBackend, ObjectStore, StorageDriver};
use crate::utils::with_scheme;

pub struct QiniuDriver {
    store: ObjectStore,
}

impl QiniuDriver {
    /// A scheme-less `domain` gets `https://` or `http://` from `use_ssl`
    pub fn new(
        backend: Arc<dyn ObjectBackend>,
        path: impl Into<String>,
        domain: &str,
        use_ssl: bool,
        concurrency: usize,
    ) -> Self {
        Self {
            store: ObjectStore::new(DriverType::Qiniu, backend, concurrency)
                .with_prefix(path)
                .with_url_base(with_scheme(domain, use_ssl)),
        }
    }
}

#[async_trait]
impl StorageDriver for QiniuDriver {
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
        DriverType::Qiniu
    }
}
