//! Upload error taxonomy / 上传错误类型
//!
//! Every failing call returns one of these kinds. Nothing here is retried.

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::DriverType;

/// Error returned by an object backend (SDK / HTTP / IO) / 后端传输错误
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = UploadError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("chunk size invalid: {0}")]
    InvalidPartSize(u64),

    #[error(
        "too many parts ({parts} >= 10000), please increase part size (current {part_size} bytes)"
    )]
    TooManyParts { parts: u64, part_size: u64 },

    #[error("error reading file chunk {number}: {source}")]
    ChunkRead {
        number: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("open file {name}, err: {source}")]
    Open {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid destination {key:?}: {reason}")]
    InvalidDestination { key: String, reason: String },

    #[error("transport error: {0}")]
    Transport(#[source] BackendError),

    #[error("init multipart upload {key}, err: {source}")]
    Initiate {
        key: String,
        #[source]
        source: BackendError,
    },

    #[error("upload part {part_number} of {key}, err: {source}")]
    PartUpload {
        key: String,
        part_number: u32,
        #[source]
        source: BackendError,
    },

    #[error("complete multipart upload {key}, err: {source}")]
    Complete {
        key: String,
        #[source]
        source: BackendError,
    },

    #[error("{operation} is not supported by the {driver} uploader")]
    NotSupported {
        driver: DriverType,
        operation: &'static str,
    },

    #[error("file uploader not supported: {0}")]
    UnknownDriverType(String),

    #[error("{0:?} should be a directory path")]
    NotADirectory(PathBuf),

    #[error("create dir {path:?}, err: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to delete: {}", .paths.join(", "))]
    Delete { paths: Vec<String> },

    #[error("upload cancelled")]
    Cancelled,

    #[error("create {driver} uploader, err: {source}")]
    Construct {
        driver: DriverType,
        #[source]
        source: BackendError,
    },
}

/// Fieldless discriminant of [`UploadError`], handy for matching in callers and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidPartSize,
    TooManyParts,
    ChunkRead,
    Open,
    InvalidDestination,
    Transport,
    Initiate,
    PartUpload,
    Complete,
    NotSupported,
    UnknownDriverType,
    NotADirectory,
    DirectoryCreate,
    Delete,
    Cancelled,
    Construct,
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPartSize(_) => ErrorKind::InvalidPartSize,
            Self::TooManyParts { .. } => ErrorKind::TooManyParts,
            Self::ChunkRead { .. } => ErrorKind::ChunkRead,
            Self::Open { .. } => ErrorKind::Open,
            Self::InvalidDestination { .. } => ErrorKind::InvalidDestination,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Initiate { .. } => ErrorKind::Initiate,
            Self::PartUpload { .. } => ErrorKind::PartUpload,
            Self::Complete { .. } => ErrorKind::Complete,
            Self::NotSupported { .. } => ErrorKind::NotSupported,
            Self::UnknownDriverType(_) => ErrorKind::UnknownDriverType,
            Self::NotADirectory(_) => ErrorKind::NotADirectory,
            Self::DirectoryCreate { .. } => ErrorKind::DirectoryCreate,
            Self::Delete { .. } => ErrorKind::Delete,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Construct { .. } => ErrorKind::Construct,
        }
    }

    /// Wrap a local IO failure as a transport error / 本地IO错误视为传输错误
    pub fn io(err: std::io::Error) -> Self {
        Self::Transport(Box::new(err))
    }

    pub fn invalid_destination(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDestination {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
