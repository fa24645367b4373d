//! File chunking for multipart uploads / 文件分片
//!
//! Splits a random-access source into ordered, contiguous parts. The part
//! count ceiling matches the common object-store limit and is checked before
//! any byte is read.

use std::io::SeekFrom;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

use crate::error::{Result, UploadError};

/// Maximum number of parts accepted by object stores / 最大分片数
pub const MAX_PARTS: u64 = 10_000;

/// Bytes per megabyte of `part_size_mb` arguments
pub const MB: u64 = 1024 * 1024;

/// One part of a file / 文件分片
#[derive(Debug, Clone)]
pub struct FileChunk {
    /// Chunk number, 1-based / 分片序号
    pub number: u32,
    /// Byte offset in the source / 分片偏移
    pub offset: u64,
    /// Chunk length / 分片大小
    pub size: u64,
    pub data: Bytes,
}

impl FileChunk {
    /// The single zero-length part that completes an empty object / 空分片
    pub fn empty() -> Self {
        Self {
            number: 1,
            offset: 0,
            size: 0,
            data: Bytes::new(),
        }
    }
}

/// Validate a part size against a file size without touching the source / 校验分片大小
pub fn check_part_size(file_size: u64, part_size: u64) -> Result<()> {
    if part_size == 0 {
        return Err(UploadError::InvalidPartSize(part_size));
    }

    let full_chunks = file_size / part_size;
    if full_chunks >= MAX_PARTS {
        return Err(UploadError::TooManyParts {
            parts: full_chunks,
            part_size,
        });
    }
    Ok(())
}

/// Lazy chunk reader over one source / 按需读取分片
///
/// Chunk N is read only when `next_chunk` is called for it, so callers decide
/// how many chunk buffers are alive at once.
pub struct ChunkSplitter<'a, R: ?Sized> {
    source: &'a mut R,
    part_size: u64,
    full_chunks: u64,
    remainder: u64,
    next: u64,
}

impl<'a, R> ChunkSplitter<'a, R>
where
    R: AsyncRead + AsyncSeek + Unpin + ?Sized,
{
    /// Validates the part size up front; no byte is read here / 创建分片读取器
    pub fn new(source: &'a mut R, file_size: u64, part_size: u64) -> Result<Self> {
        check_part_size(file_size, part_size)?;
        Ok(Self {
            source,
            part_size,
            full_chunks: file_size / part_size,
            remainder: file_size % part_size,
            next: 0,
        })
    }

    /// Number of chunks this splitter yields / 分片总数
    pub fn chunk_count(&self) -> u64 {
        self.full_chunks + u64::from(self.remainder > 0)
    }

    /// Read the next chunk, `None` once the file is covered / 读取下一个分片
    pub async fn next_chunk(&mut self) -> Option<Result<FileChunk>> {
        if self.next >= self.chunk_count() {
            return None;
        }

        let index = self.next;
        self.next += 1;

        let size = if index < self.full_chunks {
            self.part_size
        } else {
            self.remainder
        };
        let number = (index + 1) as u32;
        Some(read_chunk(&mut *self.source, number, index * self.part_size, size).await)
    }
}

/// Split `source` into `part_size` chunks, reading each one eagerly / 按分片大小切分文件
///
/// The last chunk carries the remainder. Reaching end of stream exactly at a
/// chunk boundary is fine, a short read is not.
pub async fn split_file_by_part_size<R>(
    source: &mut R,
    file_size: u64,
    part_size: u64,
) -> Result<Vec<FileChunk>>
where
    R: AsyncRead + AsyncSeek + Unpin + ?Sized,
{
    let mut splitter = ChunkSplitter::new(source, file_size, part_size)?;
    let mut chunks = Vec::with_capacity(splitter.chunk_count() as usize);

    while let Some(chunk) = splitter.next_chunk().await {
        chunks.push(chunk?);
    }

    Ok(chunks)
}

/// Read `size` bytes at `offset` / 读取单个分片
pub async fn read_chunk<R>(source: &mut R, number: u32, offset: u64, size: u64) -> Result<FileChunk>
where
    R: AsyncRead + AsyncSeek + Unpin + ?Sized,
{
    let chunk_read = |source| UploadError::ChunkRead { number, source };

    source
        .seek(SeekFrom::Start(offset))
        .await
        .map_err(chunk_read)?;

    let mut buf = vec![0u8; size as usize];
    source.read_exact(&mut buf).await.map_err(chunk_read)?;

    Ok(FileChunk {
        number,
        offset,
        size,
        data: Bytes::from(buf),
    })
}
