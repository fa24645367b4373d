use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::error::{Result, UploadError};
use crate::file::UploadFile;
use crate::naming::{base_name, gen_name, join, randomly_name};
use crate::storage::{DriverType, StorageDriver};

pub struct LocalDriver {
    root: PathBuf,
    domain: String,
}

impl LocalDriver {
    pub fn new(root: PathBuf, domain: String) -> Self {
        Self { root, domain }
    }

    /// Normalize a key to a path under root, rejecting traversal / 规范化路径
    fn normalize_path(&self, path: &str) -> Result<PathBuf> {
        let path = path.trim_start_matches('/').replace('\\', "/");

        let normalized: Vec<&str> = path
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();
        if normalized.is_empty() {
            return Err(UploadError::invalid_destination(&path, "empty path"));
        }
        if normalized.iter().any(|c| *c == "..") {
            return Err(UploadError::invalid_destination(
                &path,
                "access path exceeds root directory scope",
            ));
        }

        Ok(self.root.join(normalized.join("/")))
    }

    /// Make sure the date partition directory exists / 确保日期目录存在
    async fn ensure_dir(&self, dir_path: &Path) -> Result<()> {
        match tokio::fs::metadata(dir_path).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(UploadError::NotADirectory(dir_path.to_path_buf())),
            Err(_) => tokio::fs::create_dir_all(dir_path)
                .await
                .map_err(|source| UploadError::DirectoryCreate {
                    path: dir_path.to_path_buf(),
                    source,
                }),
        }
    }

    /// Write `file` to `file_path` through a temp file / 写入临时文件后重命名
    async fn write_file(
        &self,
        file: &UploadFile,
        file_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut reader = file.open().await?;
        self.write_from(&mut reader, file_path, cancel).await
    }

    /// Copy `reader` into a temp file next to `file_path`, then rename it into
    /// place. Each call gets its own temp name so concurrent writers of the
    /// same path never share one; the temp file is removed on every failure.
    async fn write_from<R>(
        &self,
        reader: &mut R,
        file_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let tmp_path = temp_path(file_path);

        let mut out = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
            .await
            .map_err(UploadError::io)?;

        let copied = tokio::select! {
            res = tokio::io::copy(reader, &mut out) => res.map_err(UploadError::io),
            _ = cancel.cancelled() => Err(UploadError::Cancelled),
        };
        let result = match copied {
            Ok(_) => out.flush().await.map_err(UploadError::io),
            Err(e) => Err(e),
        };
        drop(out);

        let result = match result {
            Ok(()) => tokio::fs::rename(&tmp_path, file_path)
                .await
                .map_err(UploadError::io),
            Err(e) => Err(e),
        };

        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(&tmp_path).await {
                tracing::warn!("清理临时文件失败: {:?} - {}", tmp_path, e);
            }
        }
        result
    }

    /// Remove one file or directory, then prune an emptied date directory
    /// 删除单个路径
    async fn remove_path(&self, path: &str) -> Result<()> {
        let full_path = self.normalize_path(path)?;

        let meta = tokio::fs::metadata(&full_path).await.map_err(UploadError::io)?;
        if meta.is_dir() {
            tokio::fs::remove_dir_all(&full_path).await.map_err(UploadError::io)?;
        } else {
            tokio::fs::remove_file(&full_path).await.map_err(UploadError::io)?;
        }

        if let Some(parent) = full_path.parent() {
            let prunable = parent != self.root && parent.starts_with(&self.root);
            if prunable && is_empty_dir(parent).await {
                // 目录可能已被并发删除，忽略错误
                let _ = tokio::fs::remove_dir(parent).await;
            }
        }

        Ok(())
    }
}

/// `<final>.<random>.part` / 临时文件路径
fn temp_path(file_path: &Path) -> PathBuf {
    let mut tmp_name = file_path.as_os_str().to_owned();
    tmp_name.push(format!(".{}.part", randomly_name(8)));
    PathBuf::from(tmp_name)
}

async fn is_empty_dir(path: &Path) -> bool {
    match tokio::fs::read_dir(path).await {
        Ok(mut entries) => matches!(entries.next_entry().await, Ok(None)),
        Err(_) => false,
    }
}

#[async_trait]
impl StorageDriver for LocalDriver {
    async fn upload(
        &self,
        file: &UploadFile,
        randomly: bool,
        cancel: &CancellationToken,
    ) -> Result<(String, String)> {
        if cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        if !randomly && base_name(file.name()).trim().is_empty() {
            return Err(UploadError::invalid_destination(file.name(), "invalid file name"));
        }
        let path = gen_name("", file.name(), randomly);
        let file_path = self.normalize_path(&path)?;

        if let Some(dir_path) = file_path.parent() {
            self.ensure_dir(dir_path).await?;
        }

        self.write_file(file, &file_path, cancel).await?;

        tracing::debug!("Local upload finished: {:?}", file_path);

        let file_url = join(&[self.domain.as_str(), path.as_str()]);
        Ok((path, file_url))
    }

    async fn multipart_upload(
        &self,
        _file: &UploadFile,
        _randomly: bool,
        _part_size_mb: u64,
        _cancel: &CancellationToken,
    ) -> Result<(String, String)> {
        Err(UploadError::NotSupported {
            driver: DriverType::Local,
            operation: "multipart upload",
        })
    }

    async fn delete_objects(&self, paths: &[String], cancel: &CancellationToken) -> Result<()> {
        let mut failed = Vec::new();

        for path in paths {
            if cancel.is_cancelled() {
                return Err(UploadError::Cancelled);
            }
            if let Err(e) = self.remove_path(path).await {
                tracing::warn!("Local delete failed: {} - {}", path, e);
                failed.push(path.clone());
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(UploadError::Delete { paths: failed })
        }
    }

    fn driver_type(&self) -> DriverType {
        DriverType::Local
    }
}
