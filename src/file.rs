//! Upload source / 上传文件来源

use std::io::Cursor;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncSeek};

use crate::error::{Result, UploadError};

/// Random-access reader handed out by [`UploadFile::open`]
pub trait SourceReader: AsyncRead + AsyncSeek + Unpin + Send {}

impl<T: AsyncRead + AsyncSeek + Unpin + Send> SourceReader for T {}

#[derive(Debug, Clone)]
enum Origin {
    Path(PathBuf),
    Memory(Bytes),
}

/// A file to upload: original name, size, and where its bytes live / 待上传文件
#[derive(Debug, Clone)]
pub struct UploadFile {
    name: String,
    size: u64,
    origin: Origin,
}

impl UploadFile {
    /// Describe a file on disk; its size is taken from metadata / 从本地文件创建
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|source| UploadError::Open {
                name: name.clone(),
                source,
            })?;

        Ok(Self {
            name,
            size: metadata.len(),
            origin: Origin::Path(path.to_path_buf()),
        })
    }

    /// In-memory file, e.g. a received form part / 内存文件
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            origin: Origin::Memory(data),
        }
    }

    /// Original file name / 原始文件名
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Open a fresh reader positioned at the start / 打开文件
    pub async fn open(&self) -> Result<Box<dyn SourceReader>> {
        match &self.origin {
            Origin::Path(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .map_err(|source| UploadError::Open {
                        name: self.name.clone(),
                        source,
                    })?;
                Ok(Box::new(file))
            }
            Origin::Memory(data) => Ok(Box::new(Cursor::new(data.clone()))),
        }
    }

    /// Read the whole file / 读取完整文件
    pub async fn read_all(&self) -> Result<Bytes> {
        match &self.origin {
            Origin::Memory(data) => Ok(data.clone()),
            Origin::Path(_) => {
                use tokio::io::AsyncReadExt;

                let mut reader = self.open().await?;
                let mut buf = Vec::with_capacity(self.size as usize);
                reader
                    .read_to_end(&mut buf)
                    .await
                    .map_err(|source| UploadError::Open {
                        name: self.name.clone(),
                        source,
                    })?;
                Ok(Bytes::from(buf))
            }
        }
    }
}
